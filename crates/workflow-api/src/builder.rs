// Archivo: builder.rs
// Propósito: serializar y leer definiciones, instancias y conjuntos de
// workflows en XML.
use crate::definition::WorkflowDefinition;
use crate::errors::{Result, WorkflowError};
use crate::instance::WorkflowInstance;
use crate::query::WorkflowSet;
use crate::xml::{DefinitionXml, DefinitionsXml, InstanceXml, WorkflowSetXml};
use quick_xml::{de, se};
use serde::Serialize;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Serializador/lector XML sin estado global. Se crea explícitamente y puede
/// instanciarse tantas veces como haga falta.
#[derive(Debug, Clone)]
pub struct WorkflowBuilder {
    declaration: bool,
}

impl WorkflowBuilder {
    pub fn new() -> Self {
        Self { declaration: true }
    }

    /// Omite la declaración `<?xml ...?>` al serializar.
    pub fn without_declaration(mut self) -> Self {
        self.declaration = false;
        self
    }

    fn write<T: Serialize>(&self, root: &str, value: &T) -> Result<String> {
        let body = se::to_string_with_root(root, value).map_err(|e| WorkflowError::Serialization(e.to_string()))?;
        if self.declaration {
            Ok(format!("{XML_DECLARATION}\n{body}"))
        } else {
            Ok(body)
        }
    }

    pub fn to_xml_definition(&self, definition: &WorkflowDefinition) -> Result<String> {
        self.write("definition", &DefinitionXml::from_model(definition, true))
    }

    pub fn parse_workflow_definition(&self, xml: &str) -> Result<WorkflowDefinition> {
        let doc: DefinitionXml = de::from_str(xml)?;
        doc.into_model()
    }

    pub fn to_xml_definitions(&self, definitions: &[WorkflowDefinition]) -> Result<String> {
        self.write("definitions", &DefinitionsXml::from_model(definitions))
    }

    pub fn parse_workflow_definitions(&self, xml: &str) -> Result<Vec<WorkflowDefinition>> {
        let doc: DefinitionsXml = de::from_str(xml)?;
        doc.into_model()
    }

    pub fn to_xml_instance(&self, workflow: &WorkflowInstance) -> Result<String> {
        self.write("workflow", &InstanceXml::from_model(workflow, true))
    }

    /// Lee una instancia y la rehidrata con `init()`.
    pub fn parse_workflow_instance(&self, xml: &str) -> Result<WorkflowInstance> {
        let doc: InstanceXml = de::from_str(xml)?;
        doc.into_model()
    }

    pub fn to_xml_set(&self, set: &WorkflowSet) -> Result<String> {
        self.write("workflows", &WorkflowSetXml::from_model(set))
    }

    pub fn parse_workflow_set(&self, xml: &str) -> Result<WorkflowSet> {
        let doc: WorkflowSetXml = de::from_str(xml)?;
        doc.into_model()
    }
}

impl Default for WorkflowBuilder {
    fn default() -> Self {
        Self::new()
    }
}
