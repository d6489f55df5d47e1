// Archivo: registry.rs
// Propósito: registro concurrente de handlers de operación.
use dashmap::DashMap;
use log::info;
use std::sync::Arc;
use workflow_api::WorkflowOperationHandler;

/// Handlers indexados por id de operación. Admite lecturas concurrentes y
/// altas o bajas mientras hay workflows en curso.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: DashMap<String, Arc<dyn WorkflowOperationHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra el handler bajo su id; devuelve el que reemplaza, si había.
    pub fn register(&self, handler: Arc<dyn WorkflowOperationHandler>) -> Option<Arc<dyn WorkflowOperationHandler>> {
        let id = handler.id().to_string();
        info!("handler registrado: {} ({})", id, handler.description());
        self.handlers.insert(id, handler)
    }

    pub fn unregister(&self, id: &str) -> Option<Arc<dyn WorkflowOperationHandler>> {
        self.handlers.remove(id).map(|(_, h)| h)
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn WorkflowOperationHandler>> {
        self.handlers.get(id).map(|h| h.value().clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.handlers.contains_key(id)
    }

    /// Ids registrados, ordenados.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.handlers.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }
}
