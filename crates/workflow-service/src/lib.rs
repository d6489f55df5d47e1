//! Crate `workflow-service`: implementación del servicio de workflows
//!
//! `WorkflowServiceImpl` mantiene el registro de definiciones y de handlers,
//! ejecuta el bucle de despacho operación a operación y persiste la
//! instancia tras cada paso mediante un `WorkflowRepository`.
//!
//! Ejemplo rápido:
//! ```rust
//! use std::sync::Arc;
//! use workflow_api::{ContinuingOperationHandler, InMemoryWorkflowRepository, WorkflowDefinition,
//!                    WorkflowOperationDefinition, WorkflowService, WorkflowState};
//! use workflow_service::{WorkflowServiceConfig, WorkflowServiceImpl};
//!
//! let service = WorkflowServiceImpl::new(Arc::new(InMemoryWorkflowRepository::new()),
//!                                        WorkflowServiceConfig::default()).unwrap();
//! service.register_handler(Arc::new(ContinuingOperationHandler::new("encode", "Encode")));
//! let def = WorkflowDefinition::new("demo").unwrap()
//!     .with_operation(WorkflowOperationDefinition::new("encode", None).unwrap());
//! let wf = service.start(&def, media_package::MediaPackage::new(), None).unwrap();
//! assert_eq!(wf.state(), WorkflowState::Succeeded);
//! ```
pub mod config;
pub mod definitions;
pub mod handlers;
pub mod registry;
pub mod selection;
pub mod service;
pub mod variables;
pub mod worker;

pub use config::WorkflowServiceConfig;
pub use handlers::{DefaultsOperationHandler, ErrorResolutionOperationHandler};
pub use registry::HandlerRegistry;
pub use selection::{FixedSelectionStrategy, PropertySelectionStrategy, WorkflowSelectionStrategy};
pub use service::WorkflowServiceImpl;
