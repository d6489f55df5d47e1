// Archivo: hold_state.rs
// Propósito: registro de las interfaces de usuario que exponen las
// operaciones en espera.
use dashmap::DashMap;

/// Registro concurrente de UIs de espera. Cada handler registra su recurso
/// una sola vez; registrar de nuevo devuelve la URL existente.
#[derive(Debug)]
pub struct HoldStateUiRegistry {
    base_url: String,
    urls: DashMap<String, String>,
}

impl HoldStateUiRegistry {
    pub fn new(base_url: &str) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_string(), urls: DashMap::new() }
    }

    /// Publica `resource` para el handler `handler_id` y devuelve su URL.
    pub fn register(&self, handler_id: &str, resource: &str) -> String {
        self.urls
            .entry(handler_id.to_string())
            .or_insert_with(|| format!("{}/{}/{}", self.base_url, handler_id, resource.trim_start_matches('/')))
            .value()
            .clone()
    }

    pub fn url_for(&self, handler_id: &str) -> Option<String> {
        self.urls.get(handler_id).map(|u| u.value().clone())
    }

    pub fn unregister(&self, handler_id: &str) -> bool {
        self.urls.remove(handler_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for HoldStateUiRegistry {
    fn default() -> Self {
        Self::new("/workflow/hold")
    }
}
