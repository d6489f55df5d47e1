use media_package::MediaPackage;
use std::sync::Arc;
use workflow_api::{Configurable, ContinuingOperationHandler, OperationState, ResumableOperationHandler, WorkflowDefinition,
                   WorkflowError, WorkflowInstance, WorkflowOperationDefinition, WorkflowQuery, WorkflowRepository,
                   WorkflowService, WorkflowState};
use workflow_persistence::DieselWorkflowRepository;
use workflow_service::{WorkflowServiceConfig, WorkflowServiceImpl};

fn temp_db_url() -> String {
  // Fichero temporal por test para no compartir estado entre ejecuciones.
  let tmp_path = std::env::temp_dir().join(format!("workflow_test_{}.db", uuid::Uuid::new_v4()));
  tmp_path.to_str().expect("utf-8 path").to_string()
}

fn definition() -> WorkflowDefinition {
  WorkflowDefinition::new("lecture").expect("def")
                                    .with_operation(WorkflowOperationDefinition::new("encode", None).expect("op"))
                                    .with_operation(WorkflowOperationDefinition::new("publish", None).expect("op"))
}

fn instance(id: u64) -> WorkflowInstance {
  let mut mp = MediaPackage::new();
  mp.set_title(Some(format!("Lecture {id}")));
  mp.add_creator("ada");
  let mut wf = WorkflowInstance::new(&definition(), mp, None, None).expect("instance");
  wf.set_id(id);
  wf
}

#[test]
fn stored_instance_survives_reopen() {
  let url = temp_db_url();
  let repo = DieselWorkflowRepository::new(&url).expect("repo");
  let mut wf = instance(7);
  wf.set_configuration("quality", "high");
  wf.next();
  if let Some(op) = wf.current_operation_mut() {
    op.set_state(OperationState::Paused);
  }
  wf.set_state(WorkflowState::Paused);
  wf.add_error_message("aviso");
  repo.update(&wf).expect("update");
  drop(repo);

  let reopened = DieselWorkflowRepository::new(&url).expect("reopen");
  let loaded = reopened.get_workflow_by_id(7).expect("load");
  assert_eq!(loaded.state(), WorkflowState::Paused);
  assert_eq!(loaded.template(), Some("lecture"));
  assert_eq!(loaded.get_configuration("quality"), Some("high"));
  assert_eq!(loaded.current_operation().map(|op| op.id()), Some("encode"));
  assert_eq!(loaded.error_messages(), &["aviso".to_string()]);
  assert_eq!(loaded.media_package().creators(), &["ada".to_string()]);
  // El contador continúa tras el mayor id almacenado.
  assert_eq!(reopened.next_workflow_id().expect("id"), 8);
  let _ = std::fs::remove_file(&url);
}

#[test]
fn update_replaces_and_remove_reports_missing() {
  let url = temp_db_url();
  let repo = DieselWorkflowRepository::new(&url).expect("repo");
  let mut wf = instance(1);
  repo.update(&wf).expect("insert");
  wf.set_state(WorkflowState::Stopped);
  repo.update(&wf).expect("replace");

  assert_eq!(repo.count_workflow_instances(None, None).expect("count"), 1);
  assert_eq!(repo.get_workflow_by_id(1).expect("load").state(), WorkflowState::Stopped);

  repo.remove(1).expect("remove");
  assert!(matches!(repo.get_workflow_by_id(1), Err(WorkflowError::NotFound(_))));
  assert!(matches!(repo.remove(1), Err(WorkflowError::NotFound(_))));
  let _ = std::fs::remove_file(&url);
}

#[test]
fn counts_and_queries_filter_by_state_and_operation() {
  let url = temp_db_url();
  let repo = DieselWorkflowRepository::new(&url).expect("repo");
  for id in 1..=3 {
    let mut wf = instance(id);
    wf.next();
    if id == 3 {
      wf.next();
    }
    wf.set_state(if id == 1 { WorkflowState::Running } else { WorkflowState::Paused });
    repo.update(&wf).expect("update");
  }

  assert_eq!(repo.count_workflow_instances(Some(WorkflowState::Paused), None).expect("count"), 2);
  assert_eq!(repo.count_workflow_instances(None, Some("encode")).expect("count"), 2);
  assert_eq!(repo.count_workflow_instances(Some(WorkflowState::Paused), Some("publish")).expect("count"), 1);
  assert_eq!(repo.count_workflow_instances(Some(WorkflowState::Failed), None).expect("count"), 0);

  let set = repo.get_workflow_instances(&WorkflowQuery::new().with_state(WorkflowState::Paused)).expect("query");
  assert_eq!(set.items.iter().map(|wf| wf.id()).collect::<Vec<_>>(), vec![2, 3]);
  assert_eq!(set.total_count, 2);

  let stats = repo.get_statistics().expect("stats");
  assert_eq!(stats.total(), 3);
  assert_eq!(stats.count(WorkflowState::Running), 1);
  let _ = std::fs::remove_file(&url);
}

#[test]
fn in_memory_database_shares_a_single_connection() {
  let repo = DieselWorkflowRepository::new(":memory:").expect("repo");
  assert_eq!(repo.next_workflow_id().expect("id"), 1);
  let wf = instance(5);
  repo.update(&wf).expect("update");
  assert_eq!(repo.get_workflow_by_id(5).expect("load").id(), 5);
  assert_eq!(repo.next_workflow_id().expect("id"), 6);
}

#[test]
fn service_runs_and_resumes_against_sqlite() {
  let url = temp_db_url();
  let repo = Arc::new(DieselWorkflowRepository::new(&url).expect("repo"));
  let service = WorkflowServiceImpl::new(repo, WorkflowServiceConfig::default()).expect("service");
  service.register_handler(Arc::new(ResumableOperationHandler::new("encode", "Encode with review")));
  service.register_handler(Arc::new(ContinuingOperationHandler::new("publish", "Publish")));

  let wf = service.start(&definition(), MediaPackage::new(), None).expect("start");
  assert_eq!(wf.state(), WorkflowState::Paused);
  assert_eq!(service.count_workflow_instances_by(Some(WorkflowState::Paused), Some("encode")).expect("count"), 1);

  let resumed = service.resume(wf.id()).expect("resume");
  assert_eq!(resumed.state(), WorkflowState::Succeeded);
  let stored = service.get_workflow_by_id(wf.id()).expect("stored");
  assert!(stored.operations().iter().all(|op| op.state() == OperationState::Succeeded));
  let _ = std::fs::remove_file(&url);
}

#[test]
fn ids_beyond_bigint_are_rejected_instead_of_wrapping() {
  let repo = DieselWorkflowRepository::new(":memory:").expect("repo");
  let too_big = i64::MAX as u64 + 1;
  assert!(matches!(repo.update(&instance(too_big)), Err(WorkflowError::InvalidArgument(_))));
  assert!(matches!(repo.get_workflow_by_id(too_big), Err(WorkflowError::InvalidArgument(_))));
  assert!(matches!(repo.remove(too_big), Err(WorkflowError::InvalidArgument(_))));

  let mut mp = MediaPackage::new();
  mp.set_title(Some("Child".into()));
  let child = WorkflowInstance::new(&definition(), mp, Some(u64::MAX), None).expect("instance");
  assert!(matches!(repo.update(&child), Err(WorkflowError::InvalidArgument(_))));
  assert_eq!(repo.count_workflow_instances(None, None).expect("count"), 0);
}
