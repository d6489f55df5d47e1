// Archivo: listener.rs
// Propósito: observadores de cambios de estado de las instancias.
use crate::instance::{WorkflowInstance, WorkflowState};
use log::debug;
use std::collections::HashSet;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Recibe notificaciones síncronas del servicio, con el mutex de la
/// instancia tomado. Volver al servicio para la misma instancia desde aquí
/// (`stop`, `suspend`, `resume`) devuelve `IllegalState`.
pub trait WorkflowListener: Send + Sync {
    /// La instancia cambió de estado.
    fn state_changed(&self, workflow: &WorkflowInstance);

    /// La operación actual de la instancia cambió.
    fn operation_changed(&self, workflow: &WorkflowInstance);
}

/// Cuenta los cambios de estado que pasan sus filtros. Un filtro vacío
/// acepta cualquier valor.
#[derive(Debug, Default)]
pub struct WorkflowStateListener {
    workflow_ids: HashSet<u64>,
    states: HashSet<WorkflowState>,
    counter: Mutex<usize>,
    changed: Condvar,
}

impl WorkflowStateListener {
    /// Escucha todas las instancias y todos los estados.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_workflow(id: u64) -> Self {
        Self::new().with_workflow_id(id)
    }

    pub fn for_state(state: WorkflowState) -> Self {
        Self::new().with_state(state)
    }

    pub fn with_workflow_id(mut self, id: u64) -> Self {
        self.workflow_ids.insert(id);
        self
    }

    pub fn with_state(mut self, state: WorkflowState) -> Self {
        self.states.insert(state);
        self
    }

    fn accepts(&self, workflow: &WorkflowInstance) -> bool {
        (self.workflow_ids.is_empty() || self.workflow_ids.contains(&workflow.id()))
        && (self.states.is_empty() || self.states.contains(&workflow.state()))
    }

    /// Número de cambios observados hasta ahora.
    pub fn count_state_changes(&self) -> usize {
        match self.counter.lock() {
            Ok(c) => *c,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Bloquea hasta observar al menos `n` cambios o agotar `timeout`.
    /// Devuelve si se alcanzó la cuenta.
    pub fn wait_for(&self, n: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = match self.counter.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        while *guard < n {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            guard = match self.changed.wait_timeout(guard, deadline - now) {
                Ok((g, _)) => g,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        true
    }
}

impl WorkflowListener for WorkflowStateListener {
    fn state_changed(&self, workflow: &WorkflowInstance) {
        if !self.accepts(workflow) {
            return;
        }
        let mut guard = match self.counter.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard += 1;
        debug!("workflow {} en {}: {} cambios observados", workflow.id(), workflow.state(), *guard);
        self.changed.notify_all();
    }

    fn operation_changed(&self, _workflow: &WorkflowInstance) {}
}
