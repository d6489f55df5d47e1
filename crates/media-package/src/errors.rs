// errors.rs
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaPackageError {
  #[error("Error de validación: {0}")]
  ValidationError(String),
  #[error("Elemento no encontrado: {0}")]
  ElementNotFound(String),
  #[error("Error de serialización: {0}")]
  SerializationError(String),
}

impl From<serde_json::Error> for MediaPackageError {
  fn from(e: serde_json::Error) -> Self {
    Self::SerializationError(e.to_string())
  }
}
