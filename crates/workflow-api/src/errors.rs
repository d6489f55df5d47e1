// Archivo: errors.rs
// Propósito: definir los errores del motor de workflows y el alias Result<T>
// usado por las APIs del crate.
use thiserror::Error;

/// Errores comunes del dominio de workflows.
///
/// - `NotFound`: definición o instancia inexistente (resultado esperado).
/// - `Database`: fallo de persistencia; nunca se silencia.
/// - `InvalidArgument`: precondición violada al construir un valor.
/// - `IllegalState`: transición no permitida por la máquina de estados.
/// - `Configuration`: operación sin handler registrado.
/// - `Operation`: fallo de un handler al ejecutar una operación.
/// - `Serialization`: error leyendo o escribiendo XML/JSON.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// Entidad no encontrada (definición o instancia).
    #[error("No encontrado: {0}")]
    NotFound(String),
    /// Error de la capa de persistencia.
    #[error("Error de base de datos: {0}")]
    Database(String),
    /// Argumento inválido.
    #[error("Argumento inválido: {0}")]
    InvalidArgument(String),
    /// Estado inválido para la operación solicitada.
    #[error("Estado inválido: {0}")]
    IllegalState(String),
    /// Operación sin handler resoluble.
    #[error("Error de configuración: {0}")]
    Configuration(String),
    #[error("Error de operación: {0}")]
    Operation(String),
    #[error("Error de serialización: {0}")]
    Serialization(String),
}

/// Alias de resultado usado por las APIs del crate.
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Error que devuelve un handler cuando no puede completar su trabajo. El
/// bucle de despacho lo convierte en una transición de estado.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOperationError {
    #[error("{0}")]
    Failed(String),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

impl WorkflowOperationError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

impl From<serde_json::Error> for WorkflowError {
    fn from(err: serde_json::Error) -> Self {
        WorkflowError::Serialization(err.to_string())
    }
}

impl From<quick_xml::DeError> for WorkflowError {
    fn from(err: quick_xml::DeError) -> Self {
        WorkflowError::Serialization(err.to_string())
    }
}

impl From<media_package::MediaPackageError> for WorkflowError {
    fn from(err: media_package::MediaPackageError) -> Self {
        WorkflowError::InvalidArgument(err.to_string())
    }
}
