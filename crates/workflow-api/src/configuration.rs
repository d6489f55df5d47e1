// Archivo: configuration.rs
// Propósito: pares clave/valor de configuración asociados a definiciones,
// instancias y operaciones.
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Un par clave/valor. Se ordena y compara sólo por la clave.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfiguration {
    key: String,
    value: String,
}

impl WorkflowConfiguration {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl PartialEq for WorkflowConfiguration {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for WorkflowConfiguration {}

impl PartialOrd for WorkflowConfiguration {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WorkflowConfiguration {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// Conjunto ordenado por clave; escribir una clave existente reemplaza su
/// valor en lugar de duplicarla.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configurations(BTreeMap<String, String>);

impl Configurations {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn keys(&self) -> BTreeSet<String> {
        self.0.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copia todas las entradas de `properties`, sobrescribiendo claves.
    pub fn merge(&mut self, properties: &BTreeMap<String, String>) {
        for (k, v) in properties {
            self.0.insert(k.clone(), v.clone());
        }
    }

    /// Aplica `f` a cada valor (usado para sustituir variables).
    pub fn map_values<F>(&mut self, mut f: F)
        where F: FnMut(&str) -> String
    {
        for v in self.0.values_mut() {
            *v = f(v);
        }
    }

    pub fn to_list(&self) -> Vec<WorkflowConfiguration> {
        self.0.iter().map(|(k, v)| WorkflowConfiguration::new(k.clone(), v.clone())).collect()
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }
}

impl FromIterator<(String, String)> for Configurations {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, String>> for Configurations {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

/// Acceso uniforme a la configuración de instancias y operaciones.
pub trait Configurable {
    fn configurations(&self) -> &Configurations;
    fn configurations_mut(&mut self) -> &mut Configurations;

    fn get_configuration(&self, key: &str) -> Option<&str> {
        self.configurations().get(key)
    }

    fn set_configuration(&mut self, key: &str, value: &str) {
        self.configurations_mut().set(key, value);
    }

    fn remove_configuration(&mut self, key: &str) {
        self.configurations_mut().remove(key);
    }

    fn get_configuration_keys(&self) -> BTreeSet<String> {
        self.configurations().keys()
    }
}
