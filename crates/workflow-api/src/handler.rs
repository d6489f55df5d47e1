// Archivo: handler.rs
// Propósito: contrato de los handlers de operación y dos implementaciones de
// referencia (continuar siempre / pausar hasta `resume`).
use crate::errors::WorkflowOperationError;
use crate::hold_state::HoldStateUiRegistry;
use crate::instance::WorkflowInstance;
use crate::result::{Action, WorkflowOperationResult};
use std::collections::BTreeMap;

/// Resultado de una invocación de handler.
pub type HandlerResult = Result<WorkflowOperationResult, WorkflowOperationError>;

/// Unidad de trabajo enchufable. El bucle de despacho resuelve el handler
/// por el id de la operación en cada paso.
///
/// `start` devuelve el resultado con el payload (posiblemente nuevo) y la
/// acción; `resume` se invoca sobre una operación en `PAUSED`. `destroy` es
/// una limpieza de mejor esfuerzo: sus errores se registran y se descartan.
pub trait WorkflowOperationHandler: Send + Sync {
    fn id(&self) -> &str;

    fn description(&self) -> &str;

    fn start(&self, workflow: &WorkflowInstance) -> HandlerResult;

    fn resume(&self, workflow: &WorkflowInstance, _properties: &BTreeMap<String, String>) -> HandlerResult {
        Ok(WorkflowOperationResult::with_media_package(workflow.media_package().clone(), Action::Continue))
    }

    /// Camino usado cuando la condición de la operación pide saltarla.
    fn skip(&self, workflow: &WorkflowInstance) -> HandlerResult {
        Ok(WorkflowOperationResult::with_media_package(workflow.media_package().clone(), Action::Skip))
    }

    fn destroy(&self, _workflow: &WorkflowInstance) -> Result<(), WorkflowOperationError> {
        Ok(())
    }

    fn is_resumable(&self) -> bool {
        false
    }

    fn hold_state_user_interface_url(&self) -> Option<String> {
        None
    }

    fn hold_action_title(&self) -> Option<String> {
        None
    }

    /// Claves de configuración que entiende el handler, con su descripción.
    fn configuration_options(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

/// Handler que devuelve `CONTINUE` con el payload sin cambios.
#[derive(Debug, Clone)]
pub struct ContinuingOperationHandler {
    id: String,
    description: String,
}

impl ContinuingOperationHandler {
    pub fn new(id: &str, description: &str) -> Self {
        Self { id: id.to_string(), description: description.to_string() }
    }
}

impl WorkflowOperationHandler for ContinuingOperationHandler {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn start(&self, workflow: &WorkflowInstance) -> HandlerResult {
        Ok(WorkflowOperationResult::with_media_package(workflow.media_package().clone(), Action::Continue))
    }
}

/// Handler que siempre pausa en `start` y continúa en `resume`. Puede
/// exponer una UI de espera registrada en un `HoldStateUiRegistry`.
#[derive(Debug, Clone)]
pub struct ResumableOperationHandler {
    id: String,
    description: String,
    hold_state_url: Option<String>,
    hold_action_title: Option<String>,
}

impl ResumableOperationHandler {
    pub fn new(id: &str, description: &str) -> Self {
        Self { id: id.to_string(), description: description.to_string(), hold_state_url: None, hold_action_title: None }
    }

    /// Registra el recurso de UI; repetir el registro reutiliza la URL.
    pub fn with_hold_state_ui(mut self, registry: &HoldStateUiRegistry, resource: &str, action_title: &str) -> Self {
        self.hold_state_url = Some(registry.register(&self.id, resource));
        self.hold_action_title = Some(action_title.to_string());
        self
    }
}

impl WorkflowOperationHandler for ResumableOperationHandler {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn start(&self, workflow: &WorkflowInstance) -> HandlerResult {
        Ok(WorkflowOperationResult::with_media_package(workflow.media_package().clone(), Action::Pause))
    }

    fn is_resumable(&self) -> bool {
        true
    }

    fn hold_state_user_interface_url(&self) -> Option<String> {
        self.hold_state_url.clone()
    }

    fn hold_action_title(&self) -> Option<String> {
        self.hold_action_title.clone()
    }
}
