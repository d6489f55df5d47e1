// Archivo: handlers/error_resolution.rs
use std::collections::BTreeMap;
use workflow_api::{HandlerResult, HoldStateUiRegistry, ResumableOperationHandler, WorkflowInstance,
                   WorkflowOperationHandler};

/// Retención para que una persona revise un fallo antes de continuar. Expone
/// una UI de espera.
#[derive(Debug, Clone)]
pub struct ErrorResolutionOperationHandler {
    inner: ResumableOperationHandler,
}

impl ErrorResolutionOperationHandler {
    pub const ID: &'static str = "error-resolution";

    pub fn new(registry: &HoldStateUiRegistry) -> Self {
        let inner = ResumableOperationHandler::new(Self::ID, "Espera la resolución manual de un error")
            .with_hold_state_ui(registry, "index.html", "Resolver error");
        Self { inner }
    }
}

impl WorkflowOperationHandler for ErrorResolutionOperationHandler {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn description(&self) -> &str {
        self.inner.description()
    }

    fn start(&self, workflow: &WorkflowInstance) -> HandlerResult {
        self.inner.start(workflow)
    }

    fn resume(&self, workflow: &WorkflowInstance, properties: &BTreeMap<String, String>) -> HandlerResult {
        self.inner.resume(workflow, properties)
    }

    fn is_resumable(&self) -> bool {
        true
    }

    fn hold_state_user_interface_url(&self) -> Option<String> {
        self.inner.hold_state_user_interface_url()
    }

    fn hold_action_title(&self) -> Option<String> {
        self.inner.hold_action_title()
    }

    fn configuration_options(&self) -> BTreeMap<String, String> {
        let mut options = BTreeMap::new();
        options.insert("comment".to_string(), "Comentario opcional de quien resuelve".to_string());
        options
    }
}
