// Archivo: operation.rs
// Propósito: estado en tiempo de ejecución de una operación dentro de una
// instancia de workflow.
use crate::configuration::{Configurable, Configurations};
use crate::definition::WorkflowOperationDefinition;
use crate::errors::WorkflowError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Estados posibles de una operación.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationState {
    Instantiated,
    Running,
    Paused,
    Succeeded,
    Failed,
    Skipped,
}

impl OperationState {
    /// Estados desde los que la operación no vuelve a ejecutarse.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationState::Succeeded | OperationState::Failed | OperationState::Skipped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationState::Instantiated => "INSTANTIATED",
            OperationState::Running => "RUNNING",
            OperationState::Paused => "PAUSED",
            OperationState::Succeeded => "SUCCEEDED",
            OperationState::Failed => "FAILED",
            OperationState::Skipped => "SKIPPED",
        }
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationState {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INSTANTIATED" => Ok(OperationState::Instantiated),
            "RUNNING" => Ok(OperationState::Running),
            "PAUSED" => Ok(OperationState::Paused),
            "SUCCEEDED" => Ok(OperationState::Succeeded),
            "FAILED" => Ok(OperationState::Failed),
            "SKIPPED" => Ok(OperationState::Skipped),
            other => Err(WorkflowError::InvalidArgument(format!("estado de operación desconocido: {other}"))),
        }
    }
}

/// Progreso de ejecución de una operación. Se construye copiando una
/// `WorkflowOperationDefinition`; la configuración es una copia propia.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowOperationInstance {
    id: String,
    description: Option<String>,
    state: OperationState,
    fail_workflow_on_exception: bool,
    exception_handling_workflow: Option<String>,
    execution_condition: Option<String>,
    skip_condition: Option<String>,
    configurations: Configurations,
    position: usize,
    date_started: Option<DateTime<Utc>>,
    date_completed: Option<DateTime<Utc>>,
    time_in_queue: u64,
    hold_state_user_interface_url: Option<String>,
    hold_action_title: Option<String>,
}

impl WorkflowOperationInstance {
    /// Operación vacía en estado `INSTANTIATED`.
    pub fn new(id: &str, state: OperationState) -> Self {
        Self { id: id.to_string(),
               description: None,
               state,
               fail_workflow_on_exception: true,
               exception_handling_workflow: None,
               execution_condition: None,
               skip_condition: None,
               configurations: Configurations::new(),
               position: 0,
               date_started: None,
               date_completed: None,
               time_in_queue: 0,
               hold_state_user_interface_url: None,
               hold_action_title: None }
    }

    /// Copia profunda de la definición; modificar la instancia nunca afecta
    /// a la plantilla.
    pub fn from_definition(def: &WorkflowOperationDefinition, position: usize) -> Self {
        let mut op = Self::new(def.id(), OperationState::Instantiated);
        op.description = def.description().map(str::to_string);
        op.fail_workflow_on_exception = def.is_fail_workflow_on_exception();
        op.exception_handling_workflow = def.exception_handling_workflow().map(str::to_string);
        op.execution_condition = def.execution_condition().map(str::to_string);
        op.skip_condition = def.skip_condition().map(str::to_string);
        op.configurations = def.configurations().clone();
        op.position = position;
        op
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<&str>) {
        self.description = description.map(str::to_string);
    }

    pub fn state(&self) -> OperationState {
        self.state
    }

    /// Cambia el estado sellando fechas: `RUNNING` fija `date_started`;
    /// `SUCCEEDED`, `FAILED` y `SKIPPED` fijan `date_completed`.
    pub fn set_state(&mut self, state: OperationState) {
        let now = Utc::now();
        match state {
            OperationState::Running => self.date_started = Some(now),
            OperationState::Succeeded | OperationState::Failed | OperationState::Skipped => self.date_completed = Some(now),
            _ => {}
        }
        self.state = state;
    }

    pub fn is_fail_workflow_on_exception(&self) -> bool {
        self.fail_workflow_on_exception
    }

    pub fn set_fail_workflow_on_exception(&mut self, fail: bool) {
        self.fail_workflow_on_exception = fail;
    }

    pub fn exception_handling_workflow(&self) -> Option<&str> {
        self.exception_handling_workflow.as_deref()
    }

    pub fn set_exception_handling_workflow(&mut self, workflow_id: Option<&str>) {
        self.exception_handling_workflow = workflow_id.map(str::to_string);
    }

    pub fn execution_condition(&self) -> Option<&str> {
        self.execution_condition.as_deref()
    }

    pub fn set_execution_condition(&mut self, condition: Option<String>) {
        self.execution_condition = condition;
    }

    pub fn skip_condition(&self) -> Option<&str> {
        self.skip_condition.as_deref()
    }

    pub fn set_skip_condition(&mut self, condition: Option<String>) {
        self.skip_condition = condition;
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    pub fn date_started(&self) -> Option<DateTime<Utc>> {
        self.date_started
    }

    pub fn date_completed(&self) -> Option<DateTime<Utc>> {
        self.date_completed
    }

    /// Restaura fechas persistidas sin pasar por `set_state`.
    pub fn restore_dates(&mut self, started: Option<DateTime<Utc>>, completed: Option<DateTime<Utc>>) {
        self.date_started = started;
        self.date_completed = completed;
    }

    /// Milisegundos que la operación esperó en cola.
    pub fn time_in_queue(&self) -> u64 {
        self.time_in_queue
    }

    pub fn set_time_in_queue(&mut self, millis: u64) {
        self.time_in_queue = millis;
    }

    pub fn hold_state_user_interface_url(&self) -> Option<&str> {
        self.hold_state_user_interface_url.as_deref()
    }

    pub fn set_hold_state_user_interface_url(&mut self, url: Option<String>) {
        self.hold_state_user_interface_url = url;
    }

    pub fn hold_action_title(&self) -> Option<&str> {
        self.hold_action_title.as_deref()
    }

    pub fn set_hold_action_title(&mut self, title: Option<String>) {
        self.hold_action_title = title;
    }
}

impl Configurable for WorkflowOperationInstance {
    fn configurations(&self) -> &Configurations {
        &self.configurations
    }

    fn configurations_mut(&mut self) -> &mut Configurations {
        &mut self.configurations
    }
}
