mod common;

use common::*;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::thread;
use std::time::Duration;
use workflow_api::{Action, Configurable, HandlerResult, OperationState, ResumableOperationHandler, WorkflowDefinition,
                   WorkflowError, WorkflowInstance, WorkflowListener, WorkflowOperationDefinition, WorkflowOperationHandler,
                   WorkflowOperationResult, WorkflowService, WorkflowState, WorkflowStateListener};
use workflow_service::{DefaultsOperationHandler, ErrorResolutionOperationHandler, FixedSelectionStrategy,
                       WorkflowServiceConfig};

#[test]
fn duplicate_definition_is_rejected() {
  let service = service();
  service.register_workflow_definition(definition("a", &["x"])).expect("first");
  let err = service.register_workflow_definition(definition("a", &["y"])).unwrap_err();
  assert!(matches!(err, WorkflowError::IllegalState(_)));
  assert!(matches!(service.get_workflow_definition_by_id("missing"), Err(WorkflowError::NotFound(_))));
  assert_eq!(service.unregister_workflow_definition("a").expect("unregister").id(), "a");
}

#[test]
fn runnable_requires_handlers_and_handler_workflows() {
  let service = service();
  continuing(&service, &["encode", "notify"]);
  let cleanup = definition("cleanup", &["notify"]);
  let broken_cleanup = definition("broken", &["missing"]);
  let with_cleanup = WorkflowDefinition::new("ok").expect("def")
                                                  .with_operation(WorkflowOperationDefinition::new("encode", None).expect("op")
                                                                                                                 .with_exception_handling_workflow("cleanup"));
  let with_broken = WorkflowDefinition::new("ko").expect("def")
                                                 .with_operation(WorkflowOperationDefinition::new("encode", None).expect("op")
                                                                                                                .with_exception_handling_workflow("broken"));
  for def in [cleanup, broken_cleanup, with_cleanup.clone(), with_broken.clone()] {
    service.register_workflow_definition(def).expect("register");
  }
  assert!(service.is_runnable(&with_cleanup));
  assert!(!service.is_runnable(&with_broken));

  let available: Vec<String> = service.list_available_workflow_definitions()
                                      .expect("list")
                                      .iter()
                                      .map(|d| d.id().to_string())
                                      .collect();
  assert_eq!(available, vec!["cleanup", "ok"]);
}

#[test]
fn self_referencing_handler_workflow_does_not_loop() {
  let service = service();
  continuing(&service, &["encode"]);
  let def = WorkflowDefinition::new("loop").expect("def")
                                           .with_operation(WorkflowOperationDefinition::new("encode", None).expect("op")
                                                                                                          .with_exception_handling_workflow("loop"));
  service.register_workflow_definition(def.clone()).expect("register");
  assert!(service.is_runnable(&def));
}

#[test]
fn unresolved_handler_fails_only_that_operation() {
  let service = service();
  continuing(&service, &["publish"]);
  let def = WorkflowDefinition::new("lecture").expect("def")
                                              .with_operation(WorkflowOperationDefinition::new("encode", None).expect("op")
                                                                                                             .with_fail_workflow_on_exception(false))
                                              .with_operation(WorkflowOperationDefinition::new("publish", None).expect("op"));
  let wf = service.start(&def, media_package(), None).expect("start");
  assert_eq!(wf.operations()[0].state(), OperationState::Failed);
  assert_eq!(wf.operations()[1].state(), OperationState::Succeeded);
  assert_eq!(wf.state(), WorkflowState::Succeeded);
  assert_eq!(wf.error_messages().len(), 1);
}

#[test]
fn variables_are_substituted_and_conditions_skip_operations() {
  let mut config = WorkflowServiceConfig::default();
  config.system_properties.insert("org.name".into(), "Uni".into());
  let service = service_with(config);
  let recorded = Arc::new(Mutex::new(Vec::new()));
  for id in ["encode", "publish", "archive"] {
    service.register_handler(Arc::new(RecordingHandler::new(id, &recorded)));
  }
  let def = WorkflowDefinition::new("lecture").expect("def")
                                              .with_operation(WorkflowOperationDefinition::new("encode", None).expect("op")
                                                                                                             .with_configuration("profile", "${profile}-${org.name}-${unknown}"))
                                              .with_operation(WorkflowOperationDefinition::new("publish", None).expect("op")
                                                                                                              .with_execution_condition("${publish}"))
                                              .with_operation(WorkflowOperationDefinition::new("archive", None).expect("op")
                                                                                                              .with_skip_condition("${skipArchive}"));
  let mut props = BTreeMap::new();
  props.insert("profile".to_string(), "hd".to_string());
  props.insert("publish".to_string(), "false".to_string());
  props.insert("skipArchive".to_string(), "false".to_string());

  let wf = service.start(&def, media_package(), Some(props)).expect("start");

  assert_eq!(wf.state(), WorkflowState::Succeeded);
  assert_eq!(wf.operations()[0].get_configuration("profile"), Some("hd-Uni-${unknown}"));
  assert_eq!(wf.operations()[1].state(), OperationState::Skipped);
  assert_eq!(wf.operations()[2].state(), OperationState::Succeeded);
  assert_eq!(wf.get_configuration("publish"), Some("false"));
  assert_eq!(calls(&recorded),
             vec!["encode:start", "encode:destroy", "publish:skip", "publish:destroy", "archive:start", "archive:destroy"]);
}

#[test]
fn handler_properties_are_merged_and_destroy_failures_swallowed() {
  let service = service();
  let recorded = Arc::new(Mutex::new(Vec::new()));
  let mut encode = RecordingHandler::new("encode", &recorded);
  encode.properties.insert("encoded".into(), "yes".into());
  encode.fail_destroy = true;
  service.register_handler(Arc::new(encode));
  service.register_handler(Arc::new(RecordingHandler::new("publish", &recorded)));
  let def = WorkflowDefinition::new("lecture").expect("def")
                                              .with_operation(WorkflowOperationDefinition::new("encode", None).expect("op"))
                                              .with_operation(WorkflowOperationDefinition::new("publish", None).expect("op")
                                                                                                              .with_configuration("flag", "${encoded}"));
  let wf = service.start(&def, media_package(), None).expect("start");
  assert_eq!(wf.state(), WorkflowState::Succeeded);
  assert_eq!(wf.get_configuration("encoded"), Some("yes"));
  assert_eq!(wf.operations()[1].get_configuration("flag"), Some("yes"));
}

#[test]
fn resume_merges_properties_and_exposes_hold_url() {
  let service = service();
  continuing(&service, &["publish"]);
  let hold = ResumableOperationHandler::new("review", "Review").with_hold_state_ui(service.hold_states(), "review.html", "Approve");
  service.register_handler(Arc::new(hold));
  let def = WorkflowDefinition::new("lecture").expect("def")
                                              .with_operation(WorkflowOperationDefinition::new("review", None).expect("op"))
                                              .with_operation(WorkflowOperationDefinition::new("publish", None).expect("op")
                                                                                                              .with_configuration("channel", "${channel}"));
  let wf = service.start(&def, media_package(), None).expect("start");
  let op = wf.current_operation().expect("current");
  assert_eq!(op.hold_state_user_interface_url(), Some("/workflow/hold/review/review.html"));
  assert_eq!(op.hold_action_title(), Some("Approve"));

  let mut props = BTreeMap::new();
  props.insert("channel".to_string(), "web".to_string());
  let done = service.resume_with(wf.id(), &props).expect("resume");
  assert_eq!(done.state(), WorkflowState::Succeeded);
  assert_eq!(done.get_configuration("channel"), Some("web"));
  assert_eq!(done.operations()[1].get_configuration("channel"), Some("web"));

  assert!(matches!(service.resume(wf.id()), Err(WorkflowError::IllegalState(_))));
}

#[test]
fn stop_paused_instance_is_final() {
  let service = service();
  service.register_handler(Arc::new(ResumableOperationHandler::new("review", "Review")));
  let wf = service.start(&definition("lecture", &["review"]), media_package(), None).expect("start");
  assert_eq!(wf.state(), WorkflowState::Paused);

  let stopped = service.stop(wf.id()).expect("stop");
  assert_eq!(stopped.state(), WorkflowState::Stopped);
  assert_eq!(service.stop(wf.id()).expect("again").state(), WorkflowState::Stopped);
  assert!(matches!(service.resume(wf.id()), Err(WorkflowError::IllegalState(_))));
  assert!(matches!(service.suspend(wf.id()), Err(WorkflowError::IllegalState(_))));
}

#[test]
fn stop_while_running_accepts_result_and_halts() {
  let service = Arc::new(service());
  let recorded = Arc::new(Mutex::new(Vec::new()));
  let mut slow = RecordingHandler::new("encode", &recorded);
  slow.delay = Duration::from_millis(300);
  service.register_handler(Arc::new(slow));
  service.register_handler(Arc::new(RecordingHandler::new("publish", &recorded)));
  let running = Arc::new(WorkflowStateListener::for_state(WorkflowState::Running));
  service.add_workflow_listener(running.clone());

  let runner = {
    let service = service.clone();
    thread::spawn(move || service.start(&definition("lecture", &["encode", "publish"]), media_package(), None))
  };
  assert!(running.wait_for(1, Duration::from_secs(5)));
  let id = service.get_workflow_instances(&workflow_api::WorkflowQuery::new())
                  .expect("query")
                  .items[0]
                  .id();
  let stopped = service.stop(id).expect("stop");
  let finished = runner.join().expect("join").expect("start");

  assert_eq!(stopped.state(), WorkflowState::Stopped);
  assert_eq!(finished.state(), WorkflowState::Stopped);
  assert_eq!(finished.operations()[0].state(), OperationState::Succeeded);
  assert_eq!(finished.operations()[1].state(), OperationState::Instantiated);
  assert!(!calls(&recorded).contains(&"publish:start".to_string()));
}

#[test]
fn suspend_while_running_then_resume_starts_next_operation() {
  let service = Arc::new(service());
  let recorded = Arc::new(Mutex::new(Vec::new()));
  let mut slow = RecordingHandler::new("encode", &recorded);
  slow.delay = Duration::from_millis(300);
  service.register_handler(Arc::new(slow));
  service.register_handler(Arc::new(RecordingHandler::new("publish", &recorded)));
  let running = Arc::new(WorkflowStateListener::for_state(WorkflowState::Running));
  service.add_workflow_listener(running.clone());

  let runner = {
    let service = service.clone();
    thread::spawn(move || service.start(&definition("lecture", &["encode", "publish"]), media_package(), None))
  };
  assert!(running.wait_for(1, Duration::from_secs(5)));
  let id = service.get_workflow_instances(&workflow_api::WorkflowQuery::new())
                  .expect("query")
                  .items[0]
                  .id();
  let suspended = service.suspend(id).expect("suspend");
  let returned = runner.join().expect("join").expect("start");
  assert_eq!(suspended.state(), WorkflowState::Paused);
  assert_eq!(returned.state(), WorkflowState::Paused);
  assert_eq!(returned.current_operation().map(|op| op.id()), Some("publish"));

  let done = service.resume(id).expect("resume");
  assert_eq!(done.state(), WorkflowState::Succeeded);
  assert_eq!(calls(&recorded).iter().filter(|c| c.as_str() == "publish:start").count(), 1);
}

#[test]
fn listeners_observe_transitions_and_can_be_removed() {
  let service = service();
  continuing(&service, &["encode"]);
  let all = Arc::new(WorkflowStateListener::new());
  let succeeded = Arc::new(WorkflowStateListener::for_state(WorkflowState::Succeeded));
  service.add_workflow_listener(all.clone());
  service.add_workflow_listener(succeeded.clone());

  service.start(&definition("lecture", &["encode"]), media_package(), None).expect("start");
  // INSTANTIATED -> RUNNING -> SUCCEEDED
  assert_eq!(all.count_state_changes(), 2);
  assert_eq!(succeeded.count_state_changes(), 1);

  let as_dyn: Arc<dyn WorkflowListener> = all.clone();
  service.remove_workflow_listener(&as_dyn);
  service.start(&definition("lecture", &["encode"]), media_package(), None).expect("start");
  assert_eq!(all.count_state_changes(), 2);
  assert_eq!(succeeded.count_state_changes(), 2);
}

#[test]
fn resume_many_advances_instances_in_parallel() {
  let service = service();
  continuing(&service, &["publish"]);
  service.register_handler(Arc::new(ResumableOperationHandler::new("review", "Review")));
  let def = definition("lecture", &["review", "publish"]);
  let ids: Vec<u64> = (0..5).map(|_| service.start(&def, media_package(), None).expect("start").id()).collect();

  let results = service.resume_many(&ids);
  assert_eq!(results.len(), 5);
  assert!(results.iter().all(|r| r.as_ref().is_ok_and(|wf| wf.state() == WorkflowState::Succeeded)));
  assert_eq!(service.count_workflow_instances_by(Some(WorkflowState::Succeeded), None).expect("count"), 5);
  assert_eq!(service.statistics().expect("stats").count(WorkflowState::Succeeded), 5);
}

#[test]
fn default_selection_and_parent_linkage() {
  let config = WorkflowServiceConfig { default_definition: Some("lecture".into()), ..Default::default() };
  let service = service_with(config);
  continuing(&service, &["encode"]);
  service.register_workflow_definition(definition("lecture", &["encode"])).expect("register");
  service.register_workflow_definition(definition("other", &["encode"])).expect("register");

  let parent = service.start_default(media_package(), None).expect("start");
  assert_eq!(parent.template(), Some("lecture"));

  let mut props = BTreeMap::new();
  props.insert("workflow.definition".to_string(), "other".to_string());
  let chosen = service.start_default(media_package(), Some(props)).expect("start");
  assert_eq!(chosen.template(), Some("other"));

  let child = service.start_with_parent(&definition("lecture", &["encode"]), media_package(), Some(parent.id()), None)
                     .expect("child");
  assert_eq!(child.parent_id(), Some(parent.id()));
  assert!(matches!(service.start_with_parent(&definition("lecture", &["encode"]), media_package(), Some(999), None),
                   Err(WorkflowError::NotFound(_))));

  let fixed = service_with(WorkflowServiceConfig::default()).with_selection_strategy(Box::new(FixedSelectionStrategy::new("none")));
  assert!(matches!(fixed.start_default(media_package(), None), Err(WorkflowError::NotFound(_))));
}

#[test]
fn built_in_handlers() {
  let service = service();
  assert!(service.handlers().contains(DefaultsOperationHandler::ID));
  assert!(service.handlers().contains(ErrorResolutionOperationHandler::ID));
  let def = WorkflowDefinition::new("lecture").expect("def")
                                              .with_operation(WorkflowOperationDefinition::new("defaults", None).expect("op")
                                                                                                               .with_configuration("quality", "low")
                                                                                                               .with_configuration("channel", "web"))
                                              .with_operation(WorkflowOperationDefinition::new("error-resolution", None).expect("op"));
  let mut props = BTreeMap::new();
  props.insert("quality".to_string(), "high".to_string());
  let wf = service.start(&def, media_package(), Some(props)).expect("start");
  assert_eq!(wf.get_configuration("quality"), Some("high"));
  assert_eq!(wf.get_configuration("channel"), Some("web"));
  assert_eq!(wf.state(), WorkflowState::Paused);
  assert_eq!(wf.current_operation().and_then(|op| op.hold_state_user_interface_url()),
             Some("/workflow/hold/error-resolution/index.html"));
}

#[test]
fn remove_deletes_instance() {
  let service = service();
  continuing(&service, &["encode"]);
  let wf = service.start(&definition("lecture", &["encode"]), media_package(), None).expect("start");
  assert_eq!(service.count_workflow_instances().expect("count"), 1);
  service.remove(wf.id()).expect("remove");
  assert_eq!(service.count_workflow_instances().expect("count"), 0);
  assert!(matches!(service.get_workflow_by_id(wf.id()), Err(WorkflowError::NotFound(_))));
}

/// Anota el estado de la instancia cada vez que se ejecuta.
struct StateRecorder {
  seen: Mutex<Vec<WorkflowState>>,
}

impl WorkflowOperationHandler for StateRecorder {
  fn id(&self) -> &str {
    "observe"
  }

  fn description(&self) -> &str {
    "observa el estado"
  }

  fn start(&self, workflow: &WorkflowInstance) -> HandlerResult {
    self.seen.lock().unwrap_or_else(|e| e.into_inner()).push(workflow.state());
    Ok(WorkflowOperationResult::with_action(Action::Continue))
  }
}

#[test]
fn definition_without_operations_is_rejected() {
  let service = service();
  let recorded = Arc::new(Mutex::new(Vec::new()));
  service.register_handler(Arc::new(RecordingHandler::new("prep", &recorded)));
  service.register_handler(FailingHandler::new("encode"));
  let empty = WorkflowDefinition::new("cleanup").expect("def");
  let err = service.register_workflow_definition(empty).unwrap_err();
  assert!(matches!(err, WorkflowError::InvalidArgument(_)));

  let def = WorkflowDefinition::new("lecture").expect("def")
                                              .with_operation(WorkflowOperationDefinition::new("prep", None).expect("op"))
                                              .with_operation(WorkflowOperationDefinition::new("encode", None).expect("op")
                                                                                                             .with_exception_handling_workflow("cleanup"));
  let wf = service.start(&def, media_package(), None).expect("start");

  assert_eq!(wf.state(), WorkflowState::Failed);
  assert_eq!(calls(&recorded).iter().filter(|c| c.as_str() == "prep:start").count(), 1);
  assert_eq!(wf.current_operation().map(|op| op.id()), Some("encode"));
}

#[test]
fn paused_exception_workflow_resumes_as_failing() {
  let service = service();
  service.register_handler(FailingHandler::new("encode"));
  service.register_handler(Arc::new(ResumableOperationHandler::new("hold", "Hold")));
  let observer = Arc::new(StateRecorder { seen: Mutex::new(Vec::new()) });
  service.register_handler(observer.clone());
  service.register_workflow_definition(definition("cleanup", &["hold", "observe"])).expect("register");
  let def = WorkflowDefinition::new("lecture").expect("def")
                                              .with_operation(WorkflowOperationDefinition::new("encode", None).expect("op")
                                                                                                             .with_exception_handling_workflow("cleanup"));

  let wf = service.start(&def, media_package(), None).expect("start");
  assert_eq!(wf.state(), WorkflowState::Paused);
  assert_eq!(wf.current_operation().map(|op| op.id()), Some("hold"));
  assert!(wf.is_handling_failure());

  let done = service.resume(wf.id()).expect("resume");
  assert_eq!(*observer.seen.lock().expect("seen"), vec![WorkflowState::Failing]);
  assert_eq!(done.state(), WorkflowState::Failed);
  let ids: Vec<&str> = done.operations().iter().map(|op| op.id()).collect();
  assert_eq!(ids, vec!["encode", "hold", "observe"]);
}

#[test]
fn instance_locks_are_released_after_use() {
  let service = service();
  continuing(&service, &["encode"]);
  service.register_handler(Arc::new(ResumableOperationHandler::new("review", "Review")));
  let done = service.start(&definition("lecture", &["encode"]), media_package(), None).expect("start");
  let paused = service.start(&definition("reviewed", &["review"]), media_package(), None).expect("start");
  assert!(matches!(service.stop(9_999), Err(WorkflowError::NotFound(_))));
  assert!(matches!(service.resume(done.id()), Err(WorkflowError::IllegalState(_))));
  service.stop(paused.id()).expect("stop");
  assert_eq!(service.active_instance_locks(), 0);
}

/// Intenta detener la instancia desde la notificación de pausa.
struct StopOnPause {
  service: OnceLock<Weak<Service>>,
  outcomes: Mutex<Vec<bool>>,
}

impl WorkflowListener for StopOnPause {
  fn state_changed(&self, workflow: &WorkflowInstance) {
    if workflow.state() != WorkflowState::Paused {
      return;
    }
    if let Some(service) = self.service.get().and_then(Weak::upgrade) {
      let rejected = matches!(service.stop(workflow.id()), Err(WorkflowError::IllegalState(_)));
      self.outcomes.lock().unwrap_or_else(|e| e.into_inner()).push(rejected);
    }
  }

  fn operation_changed(&self, _workflow: &WorkflowInstance) {}
}

#[test]
fn listener_calling_back_for_same_instance_is_rejected() {
  let service = Arc::new(service());
  service.register_handler(Arc::new(ResumableOperationHandler::new("review", "Review")));
  let listener = Arc::new(StopOnPause { service: OnceLock::new(), outcomes: Mutex::new(Vec::new()) });
  listener.service.set(Arc::downgrade(&service)).ok();
  service.add_workflow_listener(listener.clone());

  let wf = service.start(&definition("lecture", &["review"]), media_package(), None).expect("start");

  assert_eq!(wf.state(), WorkflowState::Paused);
  assert_eq!(*listener.outcomes.lock().expect("outcomes"), vec![true]);
  assert_eq!(service.stop(wf.id()).expect("stop").state(), WorkflowState::Stopped);
}
