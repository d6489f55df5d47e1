// Archivo: handlers/defaults.rs
use std::collections::BTreeMap;
use workflow_api::{Action, Configurable, HandlerResult, WorkflowInstance, WorkflowOperationHandler, WorkflowOperationResult};

/// Copia la configuración de la operación a la del workflow para las claves
/// que el workflow aún no define. Las copias vuelven como propiedades del
/// resultado.
#[derive(Debug, Default)]
pub struct DefaultsOperationHandler;

impl DefaultsOperationHandler {
    pub const ID: &'static str = "defaults";
}

impl WorkflowOperationHandler for DefaultsOperationHandler {
    fn id(&self) -> &str {
        Self::ID
    }

    fn description(&self) -> &str {
        "Aplica valores por defecto a la configuración del workflow"
    }

    fn start(&self, workflow: &WorkflowInstance) -> HandlerResult {
        let mut properties = BTreeMap::new();
        if let Some(op) = workflow.current_operation() {
            for (key, value) in op.configurations().iter() {
                if workflow.get_configuration(key).is_none() {
                    properties.insert(key.to_string(), value.to_string());
                }
            }
        }
        Ok(WorkflowOperationResult::with_properties(Some(workflow.media_package().clone()), properties, Action::Continue))
    }
}
