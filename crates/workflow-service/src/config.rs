// Archivo: config.rs
// Propósito: configuración explícita del servicio de workflows, con valores
// por defecto y lectura desde el entorno (`.env` incluido).
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use workflow_api::{Result, WorkflowError};

/// Prefijo de las variables de entorno que se convierten en propiedades del
/// sistema para la sustitución `${clave}`.
pub const SYSTEM_PROPERTY_PREFIX: &str = "WORKFLOW_PROPERTY_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowServiceConfig {
    /// Directorio con definiciones `*.xml` a registrar al arrancar.
    pub definitions_dir: Option<PathBuf>,
    /// Definición usada por la estrategia de selección por defecto.
    pub default_definition: Option<String>,
    /// URL base de las interfaces de espera.
    pub hold_state_base_url: String,
    /// Hilos del pool que avanza varias instancias a la vez.
    pub threads: usize,
    /// Valores de reserva para `${clave}`.
    pub system_properties: BTreeMap<String, String>,
}

impl Default for WorkflowServiceConfig {
    fn default() -> Self {
        Self { definitions_dir: None,
               default_definition: None,
               hold_state_base_url: "/workflow/hold".to_string(),
               threads: 4,
               system_properties: BTreeMap::new() }
    }
}

impl WorkflowServiceConfig {
    /// Lee la configuración del entorno:
    /// `WORKFLOW_DEFINITIONS_DIR`, `WORKFLOW_DEFAULT_DEFINITION`,
    /// `WORKFLOW_HOLD_STATE_BASE_URL`, `WORKFLOW_THREADS` y las variables
    /// `WORKFLOW_PROPERTY_<NOMBRE>`, que se exponen como `nombre` en
    /// minúsculas con `_` cambiado por `.`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(env::vars())
    }

    /// Igual que `from_env` pero sobre pares explícitos.
    pub fn from_vars<I>(vars: I) -> Result<Self>
        where I: IntoIterator<Item = (String, String)>
    {
        let mut config = Self::default();
        for (key, value) in vars {
            match key.as_str() {
                "WORKFLOW_DEFINITIONS_DIR" => config.definitions_dir = Some(PathBuf::from(value)),
                "WORKFLOW_DEFAULT_DEFINITION" => config.default_definition = Some(value),
                "WORKFLOW_HOLD_STATE_BASE_URL" => config.hold_state_base_url = value,
                "WORKFLOW_THREADS" => {
                    config.threads = value.trim()
                                          .parse::<usize>()
                                          .ok()
                                          .filter(|n| *n > 0)
                                          .ok_or_else(|| WorkflowError::Configuration(format!("WORKFLOW_THREADS inválido: {value}")))?;
                }
                other => {
                    if let Some(name) = other.strip_prefix(SYSTEM_PROPERTY_PREFIX) {
                        if !name.is_empty() {
                            config.system_properties.insert(name.to_lowercase().replace('_', "."), value);
                        }
                    }
                }
            }
        }
        Ok(config)
    }
}
