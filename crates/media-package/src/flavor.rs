// flavor.rs
use crate::MediaPackageError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Etiqueta `tipo/subtipo` que clasifica un elemento (p.ej.
/// `presenter/source`). El comodín `*` en cualquiera de las dos partes
/// coincide con todo.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Flavor {
  kind: String,
  subtype: String,
}

impl Flavor {
  pub fn new(kind: &str, subtype: &str) -> Result<Self, MediaPackageError> {
    let kind = kind.trim().to_lowercase();
    let subtype = subtype.trim().to_lowercase();
    if kind.is_empty() || subtype.is_empty() {
      return Err(MediaPackageError::ValidationError("flavor requiere tipo y subtipo".to_string()));
    }
    if kind.contains('/') || subtype.contains('/') {
      return Err(MediaPackageError::ValidationError(format!("flavor inválido: {}/{}", kind, subtype)));
    }
    Ok(Self { kind, subtype })
  }

  pub fn kind(&self) -> &str {
    &self.kind
  }

  pub fn subtype(&self) -> &str {
    &self.subtype
  }

  /// Comparación que respeta el comodín `*`.
  pub fn matches(&self, other: &Flavor) -> bool {
    let kind_ok = self.kind == "*" || other.kind == "*" || self.kind == other.kind;
    let sub_ok = self.subtype == "*" || other.subtype == "*" || self.subtype == other.subtype;
    kind_ok && sub_ok
  }
}

impl fmt::Display for Flavor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.kind, self.subtype)
  }
}

impl FromStr for Flavor {
  type Err = MediaPackageError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.split_once('/') {
      Some((kind, subtype)) => Flavor::new(kind, subtype),
      None => Err(MediaPackageError::ValidationError(format!("flavor sin separador '/': {}", s))),
    }
  }
}
