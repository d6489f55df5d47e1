// Archivo: query.rs
// Propósito: consulta filtrada y paginada de instancias de workflow.
use crate::instance::{WorkflowInstance, WorkflowState};
use std::time::Instant;

/// Término de filtro. `include` a falso expresa un filtro negativo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTerm {
    value: String,
    include: bool,
}

impl QueryTerm {
    pub fn new(value: &str, include: bool) -> Self {
        Self { value: value.to_string(), include }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_include(&self) -> bool {
        self.include
    }
}

/// Los términos de inclusión exigen coincidir con alguno; los de exclusión
/// rechazan cualquier coincidencia.
fn terms_match(terms: &[QueryTerm], value: Option<&str>) -> bool {
    let includes: Vec<&QueryTerm> = terms.iter().filter(|t| t.include).collect();
    if !includes.is_empty() && !includes.iter().any(|t| Some(t.value.as_str()) == value) {
        return false;
    }
    !terms.iter().any(|t| !t.include && Some(t.value.as_str()) == value)
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Constructor fluido de consultas.
///
/// ```
/// use workflow_api::{WorkflowQuery, WorkflowState};
/// let q = WorkflowQuery::new().with_state(WorkflowState::Failed).without_current_operation("encode");
/// assert_eq!(q.states().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowQuery {
    count: Option<usize>,
    start_page: usize,
    text: Option<String>,
    series_id: Option<String>,
    series_title: Option<String>,
    media_package_id: Option<String>,
    creator: Option<String>,
    contributor: Option<String>,
    language: Option<String>,
    license: Option<String>,
    title: Option<String>,
    subject: Option<String>,
    states: Vec<QueryTerm>,
    current_operations: Vec<QueryTerm>,
}

impl WorkflowQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tamaño de página; sin valor se devuelven todos los resultados.
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// Página inicial, empezando en cero.
    pub fn with_start_page(mut self, page: usize) -> Self {
        self.start_page = page;
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn with_series_id(mut self, series_id: &str) -> Self {
        self.series_id = Some(series_id.to_string());
        self
    }

    pub fn with_series_title(mut self, series_title: &str) -> Self {
        self.series_title = Some(series_title.to_string());
        self
    }

    pub fn with_media_package(mut self, media_package_id: &str) -> Self {
        self.media_package_id = Some(media_package_id.to_string());
        self
    }

    pub fn with_creator(mut self, creator: &str) -> Self {
        self.creator = Some(creator.to_string());
        self
    }

    pub fn with_contributor(mut self, contributor: &str) -> Self {
        self.contributor = Some(contributor.to_string());
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }

    pub fn with_license(mut self, license: &str) -> Self {
        self.license = Some(license.to_string());
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_subject(mut self, subject: &str) -> Self {
        self.subject = Some(subject.to_string());
        self
    }

    pub fn with_state(mut self, state: WorkflowState) -> Self {
        self.states.push(QueryTerm::new(state.as_str(), true));
        self
    }

    pub fn without_state(mut self, state: WorkflowState) -> Self {
        self.states.push(QueryTerm::new(state.as_str(), false));
        self
    }

    pub fn with_current_operation(mut self, operation: &str) -> Self {
        self.current_operations.push(QueryTerm::new(operation, true));
        self
    }

    pub fn without_current_operation(mut self, operation: &str) -> Self {
        self.current_operations.push(QueryTerm::new(operation, false));
        self
    }

    pub fn count(&self) -> Option<usize> {
        self.count
    }

    pub fn start_page(&self) -> usize {
        self.start_page
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn states(&self) -> &[QueryTerm] {
        &self.states
    }

    pub fn current_operations(&self) -> &[QueryTerm] {
        &self.current_operations
    }

    /// Evalúa todos los filtros sobre una instancia.
    pub fn matches(&self, workflow: &WorkflowInstance) -> bool {
        let mp = workflow.media_package();
        if !terms_match(&self.states, Some(workflow.state().as_str())) {
            return false;
        }
        if !terms_match(&self.current_operations, workflow.current_operation().map(|op| op.id())) {
            return false;
        }
        if let Some(id) = &self.media_package_id {
            if mp.id() != id {
                return false;
            }
        }
        if let Some(series) = &self.series_id {
            if mp.series() != Some(series.as_str()) {
                return false;
            }
        }
        if let Some(series_title) = &self.series_title {
            if !mp.series_title().is_some_and(|t| contains_ci(t, series_title)) {
                return false;
            }
        }
        if let Some(creator) = &self.creator {
            if !mp.creators().iter().any(|c| contains_ci(c, creator)) {
                return false;
            }
        }
        if let Some(contributor) = &self.contributor {
            if !mp.contributors().iter().any(|c| contains_ci(c, contributor)) {
                return false;
            }
        }
        if let Some(subject) = &self.subject {
            if !mp.subjects().iter().any(|s| contains_ci(s, subject)) {
                return false;
            }
        }
        if let Some(language) = &self.language {
            if !mp.language().is_some_and(|l| l.eq_ignore_ascii_case(language)) {
                return false;
            }
        }
        if let Some(license) = &self.license {
            if !mp.license().is_some_and(|l| contains_ci(l, license)) {
                return false;
            }
        }
        if let Some(title) = &self.title {
            if !mp.title().is_some_and(|t| contains_ci(t, title)) {
                return false;
            }
        }
        if let Some(text) = &self.text {
            let mut fields: Vec<&str> = Vec::new();
            fields.extend(workflow.title());
            fields.extend(workflow.template());
            fields.extend(mp.title());
            fields.extend(mp.series_title());
            fields.extend(mp.creators().iter().map(String::as_str));
            fields.extend(mp.contributors().iter().map(String::as_str));
            fields.extend(mp.subjects().iter().map(String::as_str));
            if !fields.iter().any(|f| contains_ci(f, text)) {
                return false;
            }
        }
        true
    }

    /// Filtra, ordena por id y pagina un conjunto de instancias.
    pub fn apply<I>(&self, workflows: I) -> WorkflowSet
        where I: IntoIterator<Item = WorkflowInstance>
    {
        let started = Instant::now();
        let mut matching: Vec<WorkflowInstance> = workflows.into_iter().filter(|wf| self.matches(wf)).collect();
        matching.sort_by_key(|wf| wf.id());
        let total_count = matching.len();
        let items = match self.count {
            Some(count) => matching.into_iter().skip(self.start_page.saturating_mul(count)).take(count).collect(),
            None => matching,
        };
        WorkflowSet { items,
                      start_page: self.start_page,
                      count: self.count.unwrap_or(total_count),
                      search_time: started.elapsed().as_millis() as u64,
                      total_count }
    }
}

/// Página de resultados de una consulta.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowSet {
    pub items: Vec<WorkflowInstance>,
    pub start_page: usize,
    pub count: usize,
    /// Milisegundos empleados en la búsqueda.
    pub search_time: u64,
    pub total_count: usize,
}

impl WorkflowSet {
    pub fn size(&self) -> usize {
        self.items.len()
    }
}
