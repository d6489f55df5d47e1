// Archivo: definition.rs
// Propósito: plantillas inmutables de workflow y de sus operaciones.
use crate::configuration::Configurations;
use crate::errors::{Result, WorkflowError};
use serde::{Deserialize, Serialize};

/// Descripción estática de un paso. `id` nombra el handler al que se
/// despacha la operación.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowOperationDefinition {
    id: String,
    description: Option<String>,
    exception_handling_workflow: Option<String>,
    fail_workflow_on_exception: bool,
    execution_condition: Option<String>,
    skip_condition: Option<String>,
    configurations: Configurations,
}

impl WorkflowOperationDefinition {
    pub fn new(id: &str, description: Option<&str>) -> Result<Self> {
        if id.trim().is_empty() {
            return Err(WorkflowError::InvalidArgument("el id de la operación no puede estar vacío".into()));
        }
        Ok(Self { id: id.trim().to_string(),
                  description: description.map(str::to_string),
                  exception_handling_workflow: None,
                  fail_workflow_on_exception: true,
                  execution_condition: None,
                  skip_condition: None,
                  configurations: Configurations::new() })
    }

    pub fn with_exception_handling_workflow(mut self, workflow_id: &str) -> Self {
        self.exception_handling_workflow = Some(workflow_id.to_string());
        self
    }

    pub fn with_fail_workflow_on_exception(mut self, fail: bool) -> Self {
        self.fail_workflow_on_exception = fail;
        self
    }

    pub fn with_execution_condition(mut self, condition: &str) -> Self {
        self.execution_condition = Some(condition.to_string());
        self
    }

    pub fn with_skip_condition(mut self, condition: &str) -> Self {
        self.skip_condition = Some(condition.to_string());
        self
    }

    pub fn with_configuration(mut self, key: &str, value: &str) -> Self {
        self.configurations.set(key, value);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn exception_handling_workflow(&self) -> Option<&str> {
        self.exception_handling_workflow.as_deref()
    }

    pub fn is_fail_workflow_on_exception(&self) -> bool {
        self.fail_workflow_on_exception
    }

    pub fn execution_condition(&self) -> Option<&str> {
        self.execution_condition.as_deref()
    }

    pub fn skip_condition(&self) -> Option<&str> {
        self.skip_condition.as_deref()
    }

    pub fn configurations(&self) -> &Configurations {
        &self.configurations
    }

    pub fn get_configuration(&self, key: &str) -> Option<&str> {
        self.configurations.get(key)
    }
}

/// Plantilla de workflow: lista ordenada de operaciones más metadatos.
/// `id` es la clave natural que las instancias guardan como `template`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    id: String,
    title: Option<String>,
    description: Option<String>,
    configuration_panel: Option<String>,
    published: bool,
    operations: Vec<WorkflowOperationDefinition>,
}

impl WorkflowDefinition {
    pub fn new(id: &str) -> Result<Self> {
        if id.trim().is_empty() {
            return Err(WorkflowError::InvalidArgument("la definición de workflow requiere un id".into()));
        }
        Ok(Self { id: id.trim().to_string(),
                  title: None,
                  description: None,
                  configuration_panel: None,
                  published: false,
                  operations: Vec::new() })
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Marcado de UI opaco; se conserva tal cual.
    pub fn with_configuration_panel(mut self, markup: &str) -> Self {
        self.configuration_panel = Some(markup.to_string());
        self
    }

    pub fn with_published(mut self, published: bool) -> Self {
        self.published = published;
        self
    }

    pub fn with_operation(mut self, operation: WorkflowOperationDefinition) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn add_operation(&mut self, operation: WorkflowOperationDefinition) {
        self.operations.push(operation);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn configuration_panel(&self) -> Option<&str> {
        self.configuration_panel.as_deref()
    }

    pub fn is_published(&self) -> bool {
        self.published
    }

    pub fn operations(&self) -> &[WorkflowOperationDefinition] {
        &self.operations
    }
}
