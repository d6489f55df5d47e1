// Archivo: instance.rs
// Propósito: máquina de estados de una instancia de workflow. Guarda la lista
// ordenada de operaciones y un puntero (por posición) a la operación actual.
use crate::configuration::{Configurable, Configurations};
use crate::definition::WorkflowDefinition;
use crate::errors::{Result, WorkflowError};
use crate::operation::{OperationState, WorkflowOperationInstance};
use log::debug;
use media_package::MediaPackage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Estados de una instancia de workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WorkflowState {
    Instantiated,
    Running,
    Paused,
    Stopped,
    Succeeded,
    Failed,
    Failing,
}

impl WorkflowState {
    pub const ALL: [WorkflowState; 7] = [WorkflowState::Instantiated,
                                         WorkflowState::Running,
                                         WorkflowState::Paused,
                                         WorkflowState::Stopped,
                                         WorkflowState::Succeeded,
                                         WorkflowState::Failed,
                                         WorkflowState::Failing];

    /// `SUCCEEDED`, `FAILED` y `STOPPED` no admiten más transiciones.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowState::Succeeded | WorkflowState::Failed | WorkflowState::Stopped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::Instantiated => "INSTANTIATED",
            WorkflowState::Running => "RUNNING",
            WorkflowState::Paused => "PAUSED",
            WorkflowState::Stopped => "STOPPED",
            WorkflowState::Succeeded => "SUCCEEDED",
            WorkflowState::Failed => "FAILED",
            WorkflowState::Failing => "FAILING",
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowState {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INSTANTIATED" => Ok(WorkflowState::Instantiated),
            "RUNNING" => Ok(WorkflowState::Running),
            "PAUSED" => Ok(WorkflowState::Paused),
            "STOPPED" => Ok(WorkflowState::Stopped),
            "SUCCEEDED" => Ok(WorkflowState::Succeeded),
            "FAILED" => Ok(WorkflowState::Failed),
            "FAILING" => Ok(WorkflowState::Failing),
            other => Err(WorkflowError::InvalidArgument(format!("estado de workflow desconocido: {other}"))),
        }
    }
}

/// Ejecución de una definición sobre un media package.
///
/// Invariantes:
/// - `operations` nunca está vacía.
/// - `current` es `None` o un índice válido de `operations`.
/// - `position` de cada operación coincide con su índice.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowInstance {
    id: u64,
    state: WorkflowState,
    template: Option<String>,
    title: Option<String>,
    description: Option<String>,
    parent_id: Option<u64>,
    operations: Vec<WorkflowOperationInstance>,
    current: Option<usize>,
    media_package: MediaPackage,
    configurations: Configurations,
    error_messages: Vec<String>,
}

impl WorkflowInstance {
    /// Crea una instancia en `INSTANTIATED` copiando cada operación de la
    /// definición. Las `properties` se fusionan en la configuración.
    pub fn new(definition: &WorkflowDefinition,
               media_package: MediaPackage,
               parent_id: Option<u64>,
               properties: Option<&BTreeMap<String, String>>)
               -> Result<Self> {
        if definition.operations().is_empty() {
            return Err(WorkflowError::InvalidArgument(format!("la definición '{}' no tiene operaciones", definition.id())));
        }
        let operations = definition.operations()
                                   .iter()
                                   .enumerate()
                                   .map(|(i, def)| WorkflowOperationInstance::from_definition(def, i))
                                   .collect();
        let mut configurations = Configurations::new();
        if let Some(props) = properties {
            configurations.merge(props);
        }
        Ok(Self { id: 0,
                  state: WorkflowState::Instantiated,
                  template: Some(definition.id().to_string()),
                  title: definition.title().map(str::to_string),
                  description: definition.description().map(str::to_string),
                  parent_id,
                  operations,
                  current: None,
                  media_package,
                  configurations,
                  error_messages: Vec::new() })
    }

    /// Reconstruye una instancia persistida; llama a `init()` para recalcular
    /// posiciones y operación actual.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(id: u64,
                   state: WorkflowState,
                   template: Option<String>,
                   title: Option<String>,
                   description: Option<String>,
                   parent_id: Option<u64>,
                   operations: Vec<WorkflowOperationInstance>,
                   media_package: MediaPackage,
                   configurations: Configurations,
                   error_messages: Vec<String>)
                   -> Result<Self> {
        if operations.is_empty() {
            return Err(WorkflowError::InvalidArgument(format!("la instancia {id} no tiene operaciones")));
        }
        let mut wf = Self { id,
                            state,
                            template,
                            title,
                            description,
                            parent_id,
                            operations,
                            current: None,
                            media_package,
                            configurations,
                            error_messages };
        wf.init();
        Ok(wf)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn set_state(&mut self, state: WorkflowState) {
        if self.state != state {
            debug!("workflow {}: {} -> {}", self.id, self.state, state);
        }
        self.state = state;
    }

    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title;
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn parent_id(&self) -> Option<u64> {
        self.parent_id
    }

    pub fn media_package(&self) -> &MediaPackage {
        &self.media_package
    }

    pub fn media_package_mut(&mut self) -> &mut MediaPackage {
        &mut self.media_package
    }

    pub fn set_media_package(&mut self, media_package: MediaPackage) {
        self.media_package = media_package;
    }

    pub fn operations(&self) -> &[WorkflowOperationInstance] {
        &self.operations
    }

    /// Acceso mutable a las operaciones; la longitud de la lista sólo cambia
    /// con `extend` y `truncate_after`.
    pub fn operations_mut(&mut self) -> &mut [WorkflowOperationInstance] {
        &mut self.operations
    }

    pub fn current_operation(&self) -> Option<&WorkflowOperationInstance> {
        self.current.and_then(|i| self.operations.get(i))
    }

    pub fn current_operation_mut(&mut self) -> Option<&mut WorkflowOperationInstance> {
        match self.current {
            Some(i) => self.operations.get_mut(i),
            None => None,
        }
    }

    pub fn current_position(&self) -> Option<usize> {
        self.current
    }

    /// Avanza el puntero. Sin operación actual, apunta a la primera; si no,
    /// a la siguiente en la lista. Al agotar la lista deja `None`.
    pub fn next(&mut self) -> Option<&WorkflowOperationInstance> {
        self.current = match self.current {
            None => Some(0),
            Some(i) if i + 1 < self.operations.len() => Some(i + 1),
            Some(_) => None,
        };
        self.current_operation()
    }

    /// Verdadero si alguna operación anterior a la actual falló con
    /// `fail_workflow_on_exception`: lo que queda es el workflow de excepción.
    pub fn is_handling_failure(&self) -> bool {
        let end = self.current.unwrap_or(self.operations.len());
        self.operations
            .iter()
            .take(end)
            .any(|op| op.state() == OperationState::Failed && op.is_fail_workflow_on_exception())
    }

    /// Falso en `FAILED`, `FAILING`, `STOPPED` y `SUCCEEDED`.
    pub fn has_next(&self) -> bool {
        if matches!(self.state,
                    WorkflowState::Failed | WorkflowState::Failing | WorkflowState::Stopped | WorkflowState::Succeeded)
        {
            return false;
        }
        match self.current {
            None => true,
            Some(i) => i + 1 < self.operations.len(),
        }
    }

    /// Recalcula posiciones y operación actual tras rehidratar la instancia.
    ///
    /// La primera operación `RUNNING` o `PAUSED` es la actual. Si no hay,
    /// se toma la última operación concluida: en `FAILED` es la actual sólo
    /// si falló; en estados no terminales la actual es la siguiente si sigue
    /// en `INSTANTIATED`. `SUCCEEDED` y `STOPPED` no tienen operación actual.
    pub fn init(&mut self) {
        for (i, op) in self.operations.iter_mut().enumerate() {
            op.set_position(i);
        }
        if let Some(i) = self.operations
                             .iter()
                             .position(|op| matches!(op.state(), OperationState::Running | OperationState::Paused))
        {
            self.current = Some(i);
            return;
        }
        let last_done = self.operations.iter().rposition(|op| op.state().is_terminal());
        self.current = match self.state {
            WorkflowState::Succeeded | WorkflowState::Stopped => None,
            WorkflowState::Failed => last_done.filter(|&i| self.operations[i].state() == OperationState::Failed),
            _ => match last_done {
                Some(i) => self.operations
                               .get(i + 1)
                               .filter(|op| op.state() == OperationState::Instantiated)
                               .map(|_| i + 1),
                None => None,
            },
        };
    }

    /// Agrega al final las operaciones de otra definición.
    pub fn extend(&mut self, definition: &WorkflowDefinition) {
        let offset = self.operations.len();
        self.operations.extend(definition.operations()
                                         .iter()
                                         .enumerate()
                                         .map(|(i, def)| WorkflowOperationInstance::from_definition(def, offset + i)));
        debug!("workflow {}: extendido con '{}' ({} operaciones)",
               self.id,
               definition.id(),
               definition.operations().len());
    }

    /// Descarta las operaciones posteriores a `position`.
    pub fn truncate_after(&mut self, position: usize) {
        if position + 1 < self.operations.len() {
            self.operations.truncate(position + 1);
        }
        if let Some(i) = self.current {
            if i >= self.operations.len() {
                self.current = None;
            }
        }
    }

    pub fn error_messages(&self) -> &[String] {
        &self.error_messages
    }

    /// Lista sólo de agregación.
    pub fn add_error_message(&mut self, message: impl Into<String>) {
        self.error_messages.push(message.into());
    }
}

impl Configurable for WorkflowInstance {
    fn configurations(&self) -> &Configurations {
        &self.configurations
    }

    fn configurations_mut(&mut self) -> &mut Configurations {
        &mut self.configurations
    }
}
