// Archivo: stubs.rs
// Propósito: repositorio en memoria para pruebas y demos. No es durable.
use crate::errors::{Result, WorkflowError};
use crate::instance::{WorkflowInstance, WorkflowState};
use crate::query::{WorkflowQuery, WorkflowSet};
use crate::repository::WorkflowRepository;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

pub struct InMemoryWorkflowRepository {
    /// Instancias indexadas por id.
    workflows: Mutex<BTreeMap<u64, WorkflowInstance>>,
    /// Último id entregado.
    last_id: Mutex<u64>,
}

impl InMemoryWorkflowRepository {
    pub fn new() -> Self {
        Self { workflows: Mutex::new(BTreeMap::new()), last_id: Mutex::new(0) }
    }

    /// Helper para mapear `Mutex::lock()` en un `Result` con
    /// `WorkflowError::Database`.
    fn lock<'a, T>(&'a self, m: &'a Mutex<T>) -> std::result::Result<MutexGuard<'a, T>, WorkflowError> {
        m.lock().map_err(|e| WorkflowError::Database(format!("mutex poisoned: {:?}", e)))
    }
}

impl Default for InMemoryWorkflowRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowRepository for InMemoryWorkflowRepository {
    fn get_workflow_by_id(&self, id: u64) -> Result<WorkflowInstance> {
        let workflows = self.lock(&self.workflows)?;
        workflows.get(&id)
                 .cloned()
                 .ok_or(WorkflowError::NotFound(format!("workflow {}", id)))
    }

    fn update(&self, workflow: &WorkflowInstance) -> Result<()> {
        self.lock(&self.workflows)?.insert(workflow.id(), workflow.clone());
        // Mantener el contador por encima de ids asignados externamente.
        let mut last = self.lock(&self.last_id)?;
        if workflow.id() > *last {
            *last = workflow.id();
        }
        Ok(())
    }

    fn remove(&self, id: u64) -> Result<()> {
        self.lock(&self.workflows)?
            .remove(&id)
            .map(|_| ())
            .ok_or(WorkflowError::NotFound(format!("workflow {}", id)))
    }

    fn get_workflow_instances(&self, query: &WorkflowQuery) -> Result<WorkflowSet> {
        let workflows = self.lock(&self.workflows)?;
        Ok(query.apply(workflows.values().cloned()))
    }

    fn count_workflow_instances(&self, state: Option<WorkflowState>, operation: Option<&str>) -> Result<u64> {
        let workflows = self.lock(&self.workflows)?;
        let n = workflows.values()
                         .filter(|wf| state.map_or(true, |s| wf.state() == s))
                         .filter(|wf| operation.map_or(true, |op| wf.current_operation().is_some_and(|c| c.id() == op)))
                         .count();
        Ok(n as u64)
    }

    fn next_workflow_id(&self) -> Result<u64> {
        let mut last = self.lock(&self.last_id)?;
        *last += 1;
        Ok(*last)
    }
}
