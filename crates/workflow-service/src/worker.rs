// Archivo: worker.rs
// Propósito: invocación de un handler sobre la operación actual, incluida la
// evaluación de las condiciones de ejecución.
use std::collections::BTreeMap;
use workflow_api::{HandlerResult, OperationState, WorkflowInstance, WorkflowOperationHandler, WorkflowOperationInstance};

/// Camino del handler que se invoca para la operación actual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Start,
    Resume(BTreeMap<String, String>),
    Skip,
}

impl Invocation {
    /// Elige el camino: `resume` si la operación estaba en pausa, `skip` si
    /// sus condiciones lo piden y `start` en otro caso.
    pub fn for_operation(op: &WorkflowOperationInstance, resume_properties: Option<BTreeMap<String, String>>) -> Self {
        if op.state() == OperationState::Paused {
            Invocation::Resume(resume_properties.unwrap_or_default())
        } else if should_skip(op) {
            Invocation::Skip
        } else {
            Invocation::Start
        }
    }
}

/// Una condición "if" no vacía distinta de `true`, o una "unless" igual a
/// `true`, salta la operación.
pub fn should_skip(op: &WorkflowOperationInstance) -> bool {
    let runs = op.execution_condition()
                 .map(str::trim)
                 .filter(|c| !c.is_empty())
                 .map_or(true, |c| c.eq_ignore_ascii_case("true"));
    let skipped = op.skip_condition()
                    .map(str::trim)
                    .is_some_and(|c| c.eq_ignore_ascii_case("true"));
    !runs || skipped
}

pub fn invoke(handler: &dyn WorkflowOperationHandler, workflow: &WorkflowInstance, invocation: &Invocation) -> HandlerResult {
    match invocation {
        Invocation::Start => handler.start(workflow),
        Invocation::Resume(props) => handler.resume(workflow, props),
        Invocation::Skip => handler.skip(workflow),
    }
}
