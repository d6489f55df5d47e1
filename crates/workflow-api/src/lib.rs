//! Crate `workflow-api`: modelo de ejecución de workflows
//!
//! Define las definiciones (plantillas inmutables), las instancias con su
//! máquina de estados, las operaciones, el valor que devuelven los handlers,
//! consultas y estadísticas, el contrato de persistencia con un store en
//! memoria y el contrato del servicio que orquesta todo.
//!
//! Diseño resumido:
//! - Puntero por posición: la operación actual es un índice dentro de la
//!   lista ordenada; `next()` avanza siempre hacia delante.
//! - Copia al construir: cada operación copia la configuración de su
//!   definición.
//! - Ida y vuelta XML: `WorkflowBuilder` serializa y al leer llama a `init()`.
//!
//! Ejemplo rápido:
//! ```rust
//! use workflow_api::{WorkflowDefinition, WorkflowInstance, WorkflowOperationDefinition};
//! use media_package::MediaPackage;
//! let def = WorkflowDefinition::new("demo").unwrap()
//!     .with_operation(WorkflowOperationDefinition::new("encode", None).unwrap());
//! let mut wf = WorkflowInstance::new(&def, MediaPackage::new(), None, None).unwrap();
//! assert_eq!(wf.next().map(|op| op.id().to_string()), Some("encode".to_string()));
//! ```
pub mod builder;
pub mod configuration;
pub mod definition;
pub mod errors;
pub mod handler;
pub mod hold_state;
pub mod instance;
pub mod listener;
pub mod operation;
pub mod query;
pub mod repository;
pub mod result;
pub mod service;
pub mod statistics;
pub mod stubs;
mod xml;

pub use builder::WorkflowBuilder;
pub use configuration::{Configurable, Configurations, WorkflowConfiguration};
pub use definition::{WorkflowDefinition, WorkflowOperationDefinition};
pub use errors::{Result, WorkflowError, WorkflowOperationError};
pub use handler::{ContinuingOperationHandler, HandlerResult, ResumableOperationHandler, WorkflowOperationHandler};
pub use hold_state::HoldStateUiRegistry;
pub use instance::{WorkflowInstance, WorkflowState};
pub use listener::{WorkflowListener, WorkflowStateListener};
pub use operation::{OperationState, WorkflowOperationInstance};
pub use query::{QueryTerm, WorkflowQuery, WorkflowSet};
pub use repository::WorkflowRepository;
pub use result::{Action, WorkflowOperationResult};
pub use service::WorkflowService;
pub use statistics::{OperationReport, StateCounts, WorkflowDefinitionReport, WorkflowStatistics};
pub use stubs::InMemoryWorkflowRepository;
pub use xml::WORKFLOW_NAMESPACE;
