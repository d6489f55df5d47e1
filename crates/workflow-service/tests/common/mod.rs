#![allow(dead_code)]
use media_package::MediaPackage;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use workflow_api::{Action, ContinuingOperationHandler, HandlerResult, InMemoryWorkflowRepository, WorkflowDefinition,
                   WorkflowInstance, WorkflowOperationDefinition, WorkflowOperationError, WorkflowOperationHandler,
                   WorkflowOperationResult};
use workflow_service::{WorkflowServiceConfig, WorkflowServiceImpl};

pub type Service = WorkflowServiceImpl<InMemoryWorkflowRepository>;

pub fn service() -> Service {
  WorkflowServiceImpl::new(Arc::new(InMemoryWorkflowRepository::new()), WorkflowServiceConfig::default()).expect("service")
}

pub fn service_with(config: WorkflowServiceConfig) -> Service {
  WorkflowServiceImpl::new(Arc::new(InMemoryWorkflowRepository::new()), config).expect("service")
}

pub fn continuing(service: &Service, ids: &[&str]) {
  for id in ids {
    service.register_handler(Arc::new(ContinuingOperationHandler::new(id, id)));
  }
}

pub fn definition(id: &str, ops: &[&str]) -> WorkflowDefinition {
  let mut def = WorkflowDefinition::new(id).expect("def");
  for op in ops {
    def.add_operation(WorkflowOperationDefinition::new(op, None).expect("op"));
  }
  def
}

pub fn media_package() -> MediaPackage {
  let mut mp = MediaPackage::new();
  mp.set_title(Some("Lecture".into()));
  mp
}

/// Falla siempre en `start`.
pub struct FailingHandler {
  pub id: String,
}

impl FailingHandler {
  pub fn new(id: &str) -> Arc<Self> {
    Arc::new(Self { id: id.to_string() })
  }
}

impl WorkflowOperationHandler for FailingHandler {
  fn id(&self) -> &str {
    &self.id
  }

  fn description(&self) -> &str {
    "falla"
  }

  fn start(&self, _workflow: &WorkflowInstance) -> HandlerResult {
    Err(WorkflowOperationError::failed("boom"))
  }
}

/// Registra en `calls` cada invocación como `"<id>:<camino>"`.
pub struct RecordingHandler {
  pub id: String,
  pub calls: Arc<Mutex<Vec<String>>>,
  pub properties: BTreeMap<String, String>,
  pub delay: Duration,
  pub fail_destroy: bool,
}

impl RecordingHandler {
  pub fn new(id: &str, calls: &Arc<Mutex<Vec<String>>>) -> Self {
    Self { id: id.to_string(),
           calls: calls.clone(),
           properties: BTreeMap::new(),
           delay: Duration::ZERO,
           fail_destroy: false }
  }

  fn record(&self, what: &str) {
    self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(format!("{}:{}", self.id, what));
  }
}

impl WorkflowOperationHandler for RecordingHandler {
  fn id(&self) -> &str {
    &self.id
  }

  fn description(&self) -> &str {
    "registra"
  }

  fn start(&self, workflow: &WorkflowInstance) -> HandlerResult {
    self.record("start");
    if !self.delay.is_zero() {
      thread::sleep(self.delay);
    }
    Ok(WorkflowOperationResult::with_properties(Some(workflow.media_package().clone()),
                                                self.properties.clone(),
                                                Action::Continue))
  }

  fn skip(&self, workflow: &WorkflowInstance) -> HandlerResult {
    self.record("skip");
    Ok(WorkflowOperationResult::with_media_package(workflow.media_package().clone(), Action::Skip))
  }

  fn destroy(&self, _workflow: &WorkflowInstance) -> Result<(), WorkflowOperationError> {
    self.record("destroy");
    if self.fail_destroy {
      return Err(WorkflowOperationError::failed("cleanup failed"));
    }
    Ok(())
  }
}

pub fn calls(calls: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
  calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
}
