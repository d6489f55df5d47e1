//! media-package: contenedor de pistas, catálogos y adjuntos
//!
//! Este crate modela el "payload" que transporta cada workflow. El motor de
//! workflows lo trata como un documento opaco (get/set/replace); sólo las
//! consultas leen sus metadatos (serie, creadores, título...).
mod element;
mod errors;
mod flavor;
mod media_package;

pub use element::{ElementType, MediaPackageElement};
pub use errors::MediaPackageError;
pub use flavor::Flavor;
pub use media_package::MediaPackage;
