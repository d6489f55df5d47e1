// Archivo: xml.rs
// Propósito: documentos XML intermedios (serde + quick-xml) y su conversión
// desde y hacia el modelo. Los estados viajan como texto y las fechas en
// RFC 3339.
use crate::configuration::{Configurable, Configurations};
use crate::definition::{WorkflowDefinition, WorkflowOperationDefinition};
use crate::errors::{Result, WorkflowError};
use crate::instance::{WorkflowInstance, WorkflowState};
use crate::operation::{OperationState, WorkflowOperationInstance};
use crate::query::WorkflowSet;
use chrono::{DateTime, Utc};
use media_package::{ElementType, Flavor, MediaPackage, MediaPackageElement};
use serde::{Deserialize, Serialize};

/// Espacio de nombres de los documentos de workflow.
pub const WORKFLOW_NAMESPACE: &str = "http://workflow.opencastproject.org/";

fn parse_date(value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    match value {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s.trim())
                   .map(|d| Some(d.with_timezone(&Utc)))
                   .map_err(|e| WorkflowError::Serialization(format!("fecha inválida '{s}': {e}"))),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ConfigurationXml {
    #[serde(rename = "@key")]
    key: String,
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct ConfigurationsXml {
    #[serde(rename = "configuration", default)]
    items: Vec<ConfigurationXml>,
}

impl ConfigurationsXml {
    fn from_model(configs: &Configurations) -> Option<Self> {
        if configs.is_empty() {
            return None;
        }
        Some(Self { items: configs.iter()
                                  .map(|(k, v)| ConfigurationXml { key: k.to_string(), value: v.to_string() })
                                  .collect() })
    }

    fn into_model(xml: Option<Self>) -> Configurations {
        xml.map(|c| c.items.into_iter().map(|i| (i.key, i.value)).collect())
           .unwrap_or_default()
    }
}

// --- definiciones ---

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct OperationDefinitionXml {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@description", default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "@fail-on-error", default = "default_true")]
    fail_on_error: bool,
    #[serde(rename = "@exception-handler-workflow", default, skip_serializing_if = "Option::is_none")]
    exception_handler_workflow: Option<String>,
    #[serde(rename = "@if", default, skip_serializing_if = "Option::is_none")]
    execution_condition: Option<String>,
    #[serde(rename = "@unless", default, skip_serializing_if = "Option::is_none")]
    skip_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    configurations: Option<ConfigurationsXml>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct OperationDefinitionsXml {
    #[serde(rename = "operation", default)]
    items: Vec<OperationDefinitionXml>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct DefinitionXml {
    #[serde(rename = "@xmlns", default, skip_serializing_if = "Option::is_none")]
    xmlns: Option<String>,
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    configuration_panel: Option<String>,
    #[serde(default)]
    operations: OperationDefinitionsXml,
}

impl DefinitionXml {
    pub(crate) fn from_model(def: &WorkflowDefinition, root: bool) -> Self {
        let operations = def.operations()
                            .iter()
                            .map(|op| OperationDefinitionXml { id: op.id().to_string(),
                                                               description: op.description().map(str::to_string),
                                                               fail_on_error: op.is_fail_workflow_on_exception(),
                                                               exception_handler_workflow: op.exception_handling_workflow()
                                                                                             .map(str::to_string),
                                                               execution_condition: op.execution_condition().map(str::to_string),
                                                               skip_condition: op.skip_condition().map(str::to_string),
                                                               configurations: ConfigurationsXml::from_model(op.configurations()) })
                            .collect();
        Self { xmlns: root.then(|| WORKFLOW_NAMESPACE.to_string()),
               id: def.id().to_string(),
               title: def.title().map(str::to_string),
               description: def.description().map(str::to_string),
               published: def.is_published(),
               configuration_panel: def.configuration_panel().map(str::to_string),
               operations: OperationDefinitionsXml { items: operations } }
    }

    pub(crate) fn into_model(self) -> Result<WorkflowDefinition> {
        let mut def = WorkflowDefinition::new(&self.id)?.with_published(self.published);
        if let Some(title) = non_empty(self.title) {
            def = def.with_title(&title);
        }
        if let Some(description) = non_empty(self.description) {
            def = def.with_description(&description);
        }
        if let Some(panel) = non_empty(self.configuration_panel) {
            def = def.with_configuration_panel(&panel);
        }
        for op in self.operations.items {
            let mut op_def = WorkflowOperationDefinition::new(&op.id, op.description.as_deref())?
                .with_fail_workflow_on_exception(op.fail_on_error);
            if let Some(handler) = non_empty(op.exception_handler_workflow) {
                op_def = op_def.with_exception_handling_workflow(&handler);
            }
            if let Some(cond) = non_empty(op.execution_condition) {
                op_def = op_def.with_execution_condition(&cond);
            }
            if let Some(cond) = non_empty(op.skip_condition) {
                op_def = op_def.with_skip_condition(&cond);
            }
            for (k, v) in ConfigurationsXml::into_model(op.configurations).iter() {
                op_def = op_def.with_configuration(k, v);
            }
            def.add_operation(op_def);
        }
        Ok(def)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct DefinitionsXml {
    #[serde(rename = "@xmlns", default, skip_serializing_if = "Option::is_none")]
    xmlns: Option<String>,
    #[serde(rename = "definition", default)]
    items: Vec<DefinitionXml>,
}

impl DefinitionsXml {
    pub(crate) fn from_model(defs: &[WorkflowDefinition]) -> Self {
        Self { xmlns: Some(WORKFLOW_NAMESPACE.to_string()),
               items: defs.iter().map(|d| DefinitionXml::from_model(d, false)).collect() }
    }

    pub(crate) fn into_model(self) -> Result<Vec<WorkflowDefinition>> {
        self.items.into_iter().map(DefinitionXml::into_model).collect()
    }
}

// --- media package ---

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ElementXml {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@type")]
    element_type: String,
    #[serde(rename = "@flavor")]
    flavor: String,
    url: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct ElementsXml {
    #[serde(rename = "element", default)]
    items: Vec<ElementXml>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct NamesXml {
    #[serde(rename = "name", default)]
    items: Vec<String>,
}

impl NamesXml {
    fn from_slice(names: &[String]) -> Option<Self> {
        (!names.is_empty()).then(|| Self { items: names.to_vec() })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct MediaPackageXml {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@start", default, skip_serializing_if = "Option::is_none")]
    start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    series: Option<String>,
    #[serde(rename = "seriestitle", default, skip_serializing_if = "Option::is_none")]
    series_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    creators: Option<NamesXml>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    contributors: Option<NamesXml>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subjects: Option<NamesXml>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    elements: Option<ElementsXml>,
}

impl MediaPackageXml {
    fn from_model(mp: &MediaPackage) -> Self {
        let elements = (!mp.elements().is_empty()).then(|| ElementsXml { items: mp.elements()
                                                                                 .iter()
                                                                                 .map(|e| ElementXml { id: e.id().to_string(),
                                                                                                       element_type: e.element_type().to_string(),
                                                                                                       flavor: e.flavor().to_string(),
                                                                                                       url: e.uri().to_string() })
                                                                                 .collect() });
        Self { id: mp.id().to_string(),
               start: mp.date().map(|d| d.to_rfc3339()),
               title: mp.title().map(str::to_string),
               series: mp.series().map(str::to_string),
               series_title: mp.series_title().map(str::to_string),
               creators: NamesXml::from_slice(mp.creators()),
               contributors: NamesXml::from_slice(mp.contributors()),
               subjects: NamesXml::from_slice(mp.subjects()),
               language: mp.language().map(str::to_string),
               license: mp.license().map(str::to_string),
               elements }
    }

    fn into_model(self) -> Result<MediaPackage> {
        let mut mp = MediaPackage::with_id(&self.id)?;
        mp.set_date(parse_date(self.start.as_deref())?);
        mp.set_title(non_empty(self.title));
        mp.set_series(non_empty(self.series));
        mp.set_series_title(non_empty(self.series_title));
        mp.set_language(non_empty(self.language));
        mp.set_license(non_empty(self.license));
        for c in self.creators.map(|n| n.items).unwrap_or_default() {
            mp.add_creator(&c);
        }
        for c in self.contributors.map(|n| n.items).unwrap_or_default() {
            mp.add_contributor(&c);
        }
        for s in self.subjects.map(|n| n.items).unwrap_or_default() {
            mp.add_subject(&s);
        }
        for e in self.elements.map(|e| e.items).unwrap_or_default() {
            let element_type: ElementType = e.element_type.parse()?;
            let flavor: Flavor = e.flavor.parse()?;
            mp.add_element(MediaPackageElement::new(&e.id, element_type, flavor, &e.url)?)?;
        }
        Ok(mp)
    }
}

// --- instancias ---

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct OperationInstanceXml {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@state")]
    state: String,
    #[serde(rename = "@position", default)]
    position: usize,
    #[serde(rename = "@description", default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "@fail-on-error", default = "default_true")]
    fail_on_error: bool,
    #[serde(rename = "@exception-handler-workflow", default, skip_serializing_if = "Option::is_none")]
    exception_handler_workflow: Option<String>,
    #[serde(rename = "@if", default, skip_serializing_if = "Option::is_none")]
    execution_condition: Option<String>,
    #[serde(rename = "@unless", default, skip_serializing_if = "Option::is_none")]
    skip_condition: Option<String>,
    #[serde(rename = "@time-in-queue", default)]
    time_in_queue: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    started: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed: Option<String>,
    #[serde(rename = "holdurl", default, skip_serializing_if = "Option::is_none")]
    hold_url: Option<String>,
    #[serde(rename = "hold-action-title", default, skip_serializing_if = "Option::is_none")]
    hold_action_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    configurations: Option<ConfigurationsXml>,
}

impl OperationInstanceXml {
    fn from_model(op: &WorkflowOperationInstance) -> Self {
        Self { id: op.id().to_string(),
               state: op.state().to_string(),
               position: op.position(),
               description: op.description().map(str::to_string),
               fail_on_error: op.is_fail_workflow_on_exception(),
               exception_handler_workflow: op.exception_handling_workflow().map(str::to_string),
               execution_condition: op.execution_condition().map(str::to_string),
               skip_condition: op.skip_condition().map(str::to_string),
               time_in_queue: op.time_in_queue(),
               started: op.date_started().map(|d| d.to_rfc3339()),
               completed: op.date_completed().map(|d| d.to_rfc3339()),
               hold_url: op.hold_state_user_interface_url().map(str::to_string),
               hold_action_title: op.hold_action_title().map(str::to_string),
               configurations: ConfigurationsXml::from_model(op.configurations()) }
    }

    fn into_model(self) -> Result<WorkflowOperationInstance> {
        let state: OperationState = self.state.parse()?;
        let mut op = WorkflowOperationInstance::new(&self.id, state);
        op.set_description(non_empty(self.description).as_deref());
        op.set_fail_workflow_on_exception(self.fail_on_error);
        op.set_exception_handling_workflow(non_empty(self.exception_handler_workflow).as_deref());
        op.set_execution_condition(non_empty(self.execution_condition));
        op.set_skip_condition(non_empty(self.skip_condition));
        op.set_position(self.position);
        op.set_time_in_queue(self.time_in_queue);
        op.restore_dates(parse_date(self.started.as_deref())?, parse_date(self.completed.as_deref())?);
        op.set_hold_state_user_interface_url(non_empty(self.hold_url));
        op.set_hold_action_title(non_empty(self.hold_action_title));
        *op.configurations_mut() = ConfigurationsXml::into_model(self.configurations);
        Ok(op)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct OperationInstancesXml {
    #[serde(rename = "operation", default)]
    items: Vec<OperationInstanceXml>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct ErrorsXml {
    #[serde(rename = "error", default)]
    items: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct InstanceXml {
    #[serde(rename = "@xmlns", default, skip_serializing_if = "Option::is_none")]
    xmlns: Option<String>,
    #[serde(rename = "@id")]
    id: u64,
    #[serde(rename = "@state")]
    state: String,
    #[serde(rename = "@parent", default, skip_serializing_if = "Option::is_none")]
    parent: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    mediapackage: MediaPackageXml,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    configurations: Option<ConfigurationsXml>,
    #[serde(default)]
    operations: OperationInstancesXml,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    errors: Option<ErrorsXml>,
}

impl InstanceXml {
    pub(crate) fn from_model(wf: &WorkflowInstance, root: bool) -> Self {
        Self { xmlns: root.then(|| WORKFLOW_NAMESPACE.to_string()),
               id: wf.id(),
               state: wf.state().to_string(),
               parent: wf.parent_id(),
               template: wf.template().map(str::to_string),
               title: wf.title().map(str::to_string),
               description: wf.description().map(str::to_string),
               mediapackage: MediaPackageXml::from_model(wf.media_package()),
               configurations: ConfigurationsXml::from_model(wf.configurations()),
               operations: OperationInstancesXml { items: wf.operations().iter().map(OperationInstanceXml::from_model).collect() },
               errors: (!wf.error_messages().is_empty()).then(|| ErrorsXml { items: wf.error_messages().to_vec() }) }
    }

    pub(crate) fn into_model(self) -> Result<WorkflowInstance> {
        let state: WorkflowState = self.state.parse()?;
        let operations = self.operations
                             .items
                             .into_iter()
                             .map(OperationInstanceXml::into_model)
                             .collect::<Result<Vec<_>>>()?;
        WorkflowInstance::restore(self.id,
                                  state,
                                  non_empty(self.template),
                                  non_empty(self.title),
                                  non_empty(self.description),
                                  self.parent,
                                  operations,
                                  self.mediapackage.into_model()?,
                                  ConfigurationsXml::into_model(self.configurations),
                                  self.errors.map(|e| e.items).unwrap_or_default())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct WorkflowSetXml {
    #[serde(rename = "@xmlns", default, skip_serializing_if = "Option::is_none")]
    xmlns: Option<String>,
    #[serde(rename = "@totalCount", default)]
    total_count: usize,
    #[serde(rename = "@startPage", default)]
    start_page: usize,
    #[serde(rename = "@count", default)]
    count: usize,
    #[serde(rename = "@searchTime", default)]
    search_time: u64,
    #[serde(rename = "workflow", default)]
    items: Vec<InstanceXml>,
}

impl WorkflowSetXml {
    pub(crate) fn from_model(set: &WorkflowSet) -> Self {
        Self { xmlns: Some(WORKFLOW_NAMESPACE.to_string()),
               total_count: set.total_count,
               start_page: set.start_page,
               count: set.count,
               search_time: set.search_time,
               items: set.items.iter().map(|wf| InstanceXml::from_model(wf, false)).collect() }
    }

    pub(crate) fn into_model(self) -> Result<WorkflowSet> {
        let items = self.items
                        .into_iter()
                        .map(InstanceXml::into_model)
                        .collect::<Result<Vec<_>>>()?;
        Ok(WorkflowSet { items,
                         start_page: self.start_page,
                         count: self.count,
                         search_time: self.search_time,
                         total_count: self.total_count })
    }
}
