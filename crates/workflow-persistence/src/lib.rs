//! Persistencia SQLite (Diesel) para instancias de workflow.
//! Expone el módulo `schema` y reexporta el repositorio Diesel que
//! implementa `WorkflowRepository`. El detalle está en `workflow_store.rs`.

pub mod schema;
mod workflow_store;

pub use workflow_store::{new_from_env, DieselWorkflowRepository, MIGRATIONS};
