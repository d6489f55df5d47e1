// media_package.rs
use crate::{ElementType, Flavor, MediaPackageElement, MediaPackageError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Paquete multimedia: metadatos del evento grabado más la lista de
/// elementos. Los ids de elementos son únicos dentro del paquete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPackage {
  id: String,
  title: Option<String>,
  series: Option<String>,
  series_title: Option<String>,
  creators: Vec<String>,
  contributors: Vec<String>,
  subjects: Vec<String>,
  language: Option<String>,
  license: Option<String>,
  date: Option<DateTime<Utc>>,
  elements: Vec<MediaPackageElement>,
}

impl Default for MediaPackage {
  fn default() -> Self {
    Self::new()
  }
}

impl MediaPackage {
  /// Crea un paquete vacío con un id aleatorio.
  pub fn new() -> Self {
    Self { id: Uuid::new_v4().to_string(),
           title: None,
           series: None,
           series_title: None,
           creators: Vec::new(),
           contributors: Vec::new(),
           subjects: Vec::new(),
           language: None,
           license: None,
           date: None,
           elements: Vec::new() }
  }

  /// Crea un paquete vacío con un id explícito.
  pub fn with_id(id: &str) -> Result<Self, MediaPackageError> {
    if id.trim().is_empty() {
      return Err(MediaPackageError::ValidationError("el id del media package no puede estar vacío".to_string()));
    }
    let mut mp = Self::new();
    mp.id = id.trim().to_string();
    Ok(mp)
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn title(&self) -> Option<&str> {
    self.title.as_deref()
  }

  pub fn set_title(&mut self, title: Option<String>) {
    self.title = title;
  }

  pub fn series(&self) -> Option<&str> {
    self.series.as_deref()
  }

  pub fn set_series(&mut self, series: Option<String>) {
    self.series = series;
  }

  pub fn series_title(&self) -> Option<&str> {
    self.series_title.as_deref()
  }

  pub fn set_series_title(&mut self, series_title: Option<String>) {
    self.series_title = series_title;
  }

  pub fn creators(&self) -> &[String] {
    &self.creators
  }

  pub fn add_creator(&mut self, creator: &str) {
    if !self.creators.iter().any(|c| c == creator) {
      self.creators.push(creator.to_string());
    }
  }

  pub fn contributors(&self) -> &[String] {
    &self.contributors
  }

  pub fn add_contributor(&mut self, contributor: &str) {
    if !self.contributors.iter().any(|c| c == contributor) {
      self.contributors.push(contributor.to_string());
    }
  }

  pub fn subjects(&self) -> &[String] {
    &self.subjects
  }

  pub fn add_subject(&mut self, subject: &str) {
    if !self.subjects.iter().any(|s| s == subject) {
      self.subjects.push(subject.to_string());
    }
  }

  pub fn language(&self) -> Option<&str> {
    self.language.as_deref()
  }

  pub fn set_language(&mut self, language: Option<String>) {
    self.language = language;
  }

  pub fn license(&self) -> Option<&str> {
    self.license.as_deref()
  }

  pub fn set_license(&mut self, license: Option<String>) {
    self.license = license;
  }

  pub fn date(&self) -> Option<DateTime<Utc>> {
    self.date
  }

  pub fn set_date(&mut self, date: Option<DateTime<Utc>>) {
    self.date = date;
  }

  pub fn elements(&self) -> &[MediaPackageElement] {
    &self.elements
  }

  pub fn element(&self, id: &str) -> Option<&MediaPackageElement> {
    self.elements.iter().find(|e| e.id() == id)
  }

  /// Añade un elemento. Falla si ya existe otro con el mismo id.
  pub fn add_element(&mut self, element: MediaPackageElement) -> Result<(), MediaPackageError> {
    if self.element(element.id()).is_some() {
      return Err(MediaPackageError::ValidationError(format!("elemento duplicado: {}", element.id())));
    }
    self.elements.push(element);
    Ok(())
  }

  /// Sustituye el elemento con el mismo id conservando su posición.
  pub fn replace_element(&mut self, element: MediaPackageElement) -> Result<(), MediaPackageError> {
    let slot = self.elements
                   .iter_mut()
                   .find(|e| e.id() == element.id())
                   .ok_or_else(|| MediaPackageError::ElementNotFound(element.id().to_string()))?;
    *slot = element;
    Ok(())
  }

  pub fn remove_element(&mut self, id: &str) -> Result<MediaPackageElement, MediaPackageError> {
    let idx = self.elements
                  .iter()
                  .position(|e| e.id() == id)
                  .ok_or_else(|| MediaPackageError::ElementNotFound(id.to_string()))?;
    Ok(self.elements.remove(idx))
  }

  pub fn elements_by_flavor(&self, flavor: &Flavor) -> Vec<&MediaPackageElement> {
    self.elements.iter().filter(|e| e.flavor().matches(flavor)).collect()
  }

  pub fn elements_by_type(&self, element_type: ElementType) -> Vec<&MediaPackageElement> {
    self.elements.iter().filter(|e| e.element_type() == element_type).collect()
  }
}
