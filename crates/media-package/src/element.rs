// element.rs
use crate::{Flavor, MediaPackageError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tipo de elemento contenido en un media package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
  Track,
  Catalog,
  Attachment,
}

impl fmt::Display for ElementType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      ElementType::Track => "track",
      ElementType::Catalog => "catalog",
      ElementType::Attachment => "attachment",
    };
    write!(f, "{}", s)
  }
}

impl FromStr for ElementType {
  type Err = MediaPackageError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "track" => Ok(ElementType::Track),
      "catalog" => Ok(ElementType::Catalog),
      "attachment" => Ok(ElementType::Attachment),
      other => Err(MediaPackageError::ValidationError(format!("tipo de elemento desconocido: {}", other))),
    }
  }
}

/// Un elemento (pista, catálogo o adjunto) referenciado por URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPackageElement {
  id: String,
  element_type: ElementType,
  flavor: Flavor,
  uri: String,
}

impl MediaPackageElement {
  pub fn new(id: &str, element_type: ElementType, flavor: Flavor, uri: &str) -> Result<Self, MediaPackageError> {
    if id.trim().is_empty() {
      return Err(MediaPackageError::ValidationError("el id del elemento no puede estar vacío".to_string()));
    }
    if uri.trim().is_empty() {
      return Err(MediaPackageError::ValidationError(format!("el elemento {} no tiene URI", id)));
    }
    Ok(Self { id: id.to_string(), element_type, flavor, uri: uri.to_string() })
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn element_type(&self) -> ElementType {
    self.element_type
  }

  pub fn flavor(&self) -> &Flavor {
    &self.flavor
  }

  pub fn uri(&self) -> &str {
    &self.uri
  }
}
