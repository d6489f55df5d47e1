use media_package::MediaPackage;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use workflow_api::{WorkflowDefinition, WorkflowInstance, WorkflowListener, WorkflowOperationDefinition, WorkflowState,
                   WorkflowStateListener};

fn instance(id: u64, state: WorkflowState) -> WorkflowInstance {
  let def = WorkflowDefinition::new("w").expect("def")
                                        .with_operation(WorkflowOperationDefinition::new("a", None).expect("op"));
  let mut wf = WorkflowInstance::new(&def, MediaPackage::new(), None, None).expect("instance");
  wf.set_id(id);
  wf.set_state(state);
  wf
}

#[test]
fn global_listener_counts_everything() {
  let listener = WorkflowStateListener::new();
  listener.state_changed(&instance(1, WorkflowState::Running));
  listener.state_changed(&instance(2, WorkflowState::Succeeded));
  listener.operation_changed(&instance(2, WorkflowState::Succeeded));
  assert_eq!(listener.count_state_changes(), 2);
}

#[test]
fn filters_by_id_and_state() {
  let by_id = WorkflowStateListener::for_workflow(1);
  let by_state = WorkflowStateListener::for_state(WorkflowState::Succeeded);
  let both = WorkflowStateListener::for_workflow(2).with_state(WorkflowState::Paused).with_state(WorkflowState::Succeeded);
  for wf in [instance(1, WorkflowState::Running),
             instance(1, WorkflowState::Succeeded),
             instance(2, WorkflowState::Running),
             instance(2, WorkflowState::Succeeded)]
  {
    by_id.state_changed(&wf);
    by_state.state_changed(&wf);
    both.state_changed(&wf);
  }
  assert_eq!(by_id.count_state_changes(), 2);
  assert_eq!(by_state.count_state_changes(), 2);
  assert_eq!(both.count_state_changes(), 1);
}

#[test]
fn wait_for_blocks_until_count_reached() {
  let listener = Arc::new(WorkflowStateListener::new());
  let notifier = listener.clone();
  let handle = thread::spawn(move || {
    for _ in 0..3 {
      thread::sleep(Duration::from_millis(10));
      notifier.state_changed(&instance(1, WorkflowState::Running));
    }
  });
  assert!(listener.wait_for(3, Duration::from_secs(5)));
  handle.join().expect("join");
  assert!(!listener.wait_for(4, Duration::from_millis(20)));
}
