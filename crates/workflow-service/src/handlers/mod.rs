// Archivo: handlers/mod.rs
// Propósito: handlers incluidos con el servicio.
mod defaults;
mod error_resolution;

pub use defaults::DefaultsOperationHandler;
pub use error_resolution::ErrorResolutionOperationHandler;
