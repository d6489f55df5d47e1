// Archivo: result.rs
// Propósito: valor que devuelve un handler tras ejecutar una operación.
use crate::errors::{Result, WorkflowError};
use media_package::MediaPackage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Acción de control que decide cómo sigue el bucle de despacho.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Avanzar a la siguiente operación.
    Continue,
    /// Detener el avance hasta un `resume` externo.
    Pause,
    /// Avanzar sin aplicar efectos del handler.
    Skip,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Continue => "CONTINUE",
            Action::Pause => "PAUSE",
            Action::Skip => "SKIP",
        };
        f.write_str(s)
    }
}

impl FromStr for Action {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CONTINUE" => Ok(Action::Continue),
            "PAUSE" => Ok(Action::Pause),
            "SKIP" => Ok(Action::Skip),
            other => Err(WorkflowError::InvalidArgument(format!("acción desconocida: {other}"))),
        }
    }
}

/// Resultado de `start`/`resume`/`skip`. La acción es obligatoria.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowOperationResult {
    media_package: Option<MediaPackage>,
    properties: Option<BTreeMap<String, String>>,
    action: Action,
    time_in_queue: u64,
}

impl WorkflowOperationResult {
    /// Constructor completo. Rechaza un `action` ausente con
    /// `InvalidArgument`.
    pub fn new(media_package: Option<MediaPackage>,
               properties: Option<BTreeMap<String, String>>,
               action: Option<Action>,
               time_in_queue: u64)
               -> Result<Self> {
        let action = action.ok_or_else(|| WorkflowError::InvalidArgument("la acción del resultado no puede ser nula".into()))?;
        Ok(Self { media_package, properties, action, time_in_queue })
    }

    /// Sólo acción; sin payload ni propiedades.
    pub fn with_action(action: Action) -> Self {
        Self { media_package: None, properties: None, action, time_in_queue: 0 }
    }

    /// Payload y acción.
    pub fn with_media_package(media_package: MediaPackage, action: Action) -> Self {
        Self { media_package: Some(media_package), properties: None, action, time_in_queue: 0 }
    }

    /// Payload, acción y tiempo en cola.
    pub fn with_time_in_queue(media_package: Option<MediaPackage>, action: Action, time_in_queue: u64) -> Self {
        Self { media_package, properties: None, action, time_in_queue }
    }

    /// Payload, propiedades y acción.
    pub fn with_properties(media_package: Option<MediaPackage>, properties: BTreeMap<String, String>, action: Action) -> Self {
        Self { media_package, properties: Some(properties), action, time_in_queue: 0 }
    }

    pub fn media_package(&self) -> Option<&MediaPackage> {
        self.media_package.as_ref()
    }

    pub fn properties(&self) -> Option<&BTreeMap<String, String>> {
        self.properties.as_ref()
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn time_in_queue(&self) -> u64 {
        self.time_in_queue
    }

    pub fn set_time_in_queue(&mut self, millis: u64) {
        self.time_in_queue = millis;
    }

    /// Separa el resultado en payload y propiedades para aplicarlo.
    pub fn into_parts(self) -> (Option<MediaPackage>, Option<BTreeMap<String, String>>, Action, u64) {
        (self.media_package, self.properties, self.action, self.time_in_queue)
    }
}
