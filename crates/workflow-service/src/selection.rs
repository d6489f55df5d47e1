// Archivo: selection.rs
// Propósito: estrategias que eligen la definición a usar cuando el llamador
// no indica ninguna.
use media_package::MediaPackage;
use std::collections::BTreeMap;

/// Propiedad consultada por `PropertySelectionStrategy`.
pub const WORKFLOW_DEFINITION_PROPERTY: &str = "workflow.definition";

/// Devuelve el id de la definición a usar, o `None` si no puede decidir.
pub trait WorkflowSelectionStrategy: Send + Sync {
    fn select(&self, media_package: &MediaPackage, properties: Option<&BTreeMap<String, String>>) -> Option<String>;
}

/// Siempre la misma definición.
#[derive(Debug, Clone)]
pub struct FixedSelectionStrategy {
    definition_id: String,
}

impl FixedSelectionStrategy {
    pub fn new(definition_id: &str) -> Self {
        Self { definition_id: definition_id.to_string() }
    }
}

impl WorkflowSelectionStrategy for FixedSelectionStrategy {
    fn select(&self, _media_package: &MediaPackage, _properties: Option<&BTreeMap<String, String>>) -> Option<String> {
        Some(self.definition_id.clone())
    }
}

/// Lee `workflow.definition` de las propiedades y recurre a `fallback`.
#[derive(Debug, Clone, Default)]
pub struct PropertySelectionStrategy {
    fallback: Option<String>,
}

impl PropertySelectionStrategy {
    pub fn new(fallback: Option<String>) -> Self {
        Self { fallback }
    }
}

impl WorkflowSelectionStrategy for PropertySelectionStrategy {
    fn select(&self, _media_package: &MediaPackage, properties: Option<&BTreeMap<String, String>>) -> Option<String> {
        properties.and_then(|p| p.get(WORKFLOW_DEFINITION_PROPERTY))
                  .filter(|v| !v.trim().is_empty())
                  .cloned()
                  .or_else(|| self.fallback.clone())
    }
}
