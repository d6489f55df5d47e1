// Archivo: service.rs
// Propósito: implementación del servicio de workflows: registro de
// definiciones y handlers, bucle de despacho, pausa/parada concurrente y
// persistencia tras cada paso.
use crate::config::WorkflowServiceConfig;
use crate::definitions::load_definitions;
use crate::handlers::{DefaultsOperationHandler, ErrorResolutionOperationHandler};
use crate::registry::HandlerRegistry;
use crate::selection::{PropertySelectionStrategy, WorkflowSelectionStrategy};
use crate::variables;
use crate::worker::{self, Invocation};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::{debug, error, info, warn};
use media_package::MediaPackage;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};
use workflow_api::{Action, Configurable, HoldStateUiRegistry, OperationState, Result, WorkflowBuilder,
                   WorkflowDefinition, WorkflowError, WorkflowInstance, WorkflowListener, WorkflowOperationHandler,
                   WorkflowOperationResult, WorkflowQuery, WorkflowRepository, WorkflowService, WorkflowSet,
                   WorkflowState, WorkflowStatistics};

/// Petición externa que el bucle atiende en el siguiente límite de
/// operación.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlSignal {
    Stop,
    Suspend,
}

thread_local! {
    /// Mutex de instancia que el hilo actual mantiene, por servicio.
    static HELD_LOCKS: RefCell<HashSet<(usize, u64)>> = RefCell::new(HashSet::new());
}

/// Marca el mutex como tomado por este hilo mientras vive.
struct HeldLock {
    key: (usize, u64),
}

impl HeldLock {
    fn acquire(key: (usize, u64)) -> Self {
        HELD_LOCKS.with(|held| held.borrow_mut().insert(key));
        Self { key }
    }
}

impl Drop for HeldLock {
    fn drop(&mut self) {
        HELD_LOCKS.with(|held| held.borrow_mut().remove(&self.key));
    }
}

/// Servicio de workflows sobre un repositorio `R`.
///
/// Concurrencia:
/// - Cada instancia tiene un único escritor: todo cambio pasa por un mutex
///   por id (`locks`), que el bucle mantiene mientras avanza.
/// - `stop` y `suspend` dejan una señal (`signals`) que el bucle consulta
///   entre operaciones y luego esperan el mutex para aplicar el cambio.
/// - Registros de handlers y definiciones admiten lectura concurrente.
pub struct WorkflowServiceImpl<R>
    where R: WorkflowRepository
{
    repo: Arc<R>,
    config: WorkflowServiceConfig,
    builder: WorkflowBuilder,
    definitions: DashMap<String, WorkflowDefinition>,
    handlers: HandlerRegistry,
    hold_states: HoldStateUiRegistry,
    selection: Box<dyn WorkflowSelectionStrategy>,
    listeners: RwLock<Vec<Arc<dyn WorkflowListener>>>,
    locks: DashMap<u64, Arc<Mutex<()>>>,
    signals: DashMap<u64, ControlSignal>,
    pool: ThreadPool,
}

impl<R> WorkflowServiceImpl<R> where R: WorkflowRepository
{
    /// Crea el servicio, registra los handlers incluidos y carga las
    /// definiciones de `definitions_dir` si está configurado.
    pub fn new(repo: Arc<R>, config: WorkflowServiceConfig) -> Result<Self> {
        let pool = ThreadPoolBuilder::new().num_threads(config.threads)
                                           .build()
                                           .map_err(|e| WorkflowError::Configuration(format!("pool de hilos: {e}")))?;
        let hold_states = HoldStateUiRegistry::new(&config.hold_state_base_url);
        let selection = Box::new(PropertySelectionStrategy::new(config.default_definition.clone()));
        let service = Self { repo,
                             config,
                             builder: WorkflowBuilder::new(),
                             definitions: DashMap::new(),
                             handlers: HandlerRegistry::new(),
                             hold_states,
                             selection,
                             listeners: RwLock::new(Vec::new()),
                             locks: DashMap::new(),
                             signals: DashMap::new(),
                             pool };
        service.handlers.register(Arc::new(DefaultsOperationHandler));
        service.handlers
               .register(Arc::new(ErrorResolutionOperationHandler::new(&service.hold_states)));
        if let Some(dir) = service.config.definitions_dir.clone() {
            for def in load_definitions(&dir, &service.builder)? {
                service.register_workflow_definition(def)?;
            }
        }
        Ok(service)
    }

    pub fn with_selection_strategy(mut self, strategy: Box<dyn WorkflowSelectionStrategy>) -> Self {
        self.selection = strategy;
        self
    }

    pub fn register_handler(&self, handler: Arc<dyn WorkflowOperationHandler>) {
        self.handlers.register(handler);
    }

    pub fn unregister_handler(&self, id: &str) -> Option<Arc<dyn WorkflowOperationHandler>> {
        self.handlers.unregister(id)
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn hold_states(&self) -> &HoldStateUiRegistry {
        &self.hold_states
    }

    pub fn builder(&self) -> &WorkflowBuilder {
        &self.builder
    }

    pub fn config(&self) -> &WorkflowServiceConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    /// Reanuda varias instancias distintas en paralelo sobre el pool. Cada
    /// instancia conserva un único escritor.
    pub fn resume_many(&self, ids: &[u64]) -> Vec<Result<WorkflowInstance>> {
        self.pool.install(|| ids.par_iter().map(|id| self.resume(*id)).collect())
    }

    /// Mutex de instancia vivos; sólo existen mientras alguien los usa.
    pub fn active_instance_locks(&self) -> usize {
        self.locks.len()
    }

    /// Ejecuta `f` con el mutex de la instancia. Una llamada reentrante
    /// desde el mismo hilo (un listener que vuelve al servicio) falla con
    /// `IllegalState`. La entrada del mapa se descarta si nadie más la usa.
    fn with_instance_lock<T, F>(&self, id: u64, f: F) -> Result<T>
        where F: FnOnce() -> Result<T>
    {
        let key = (self as *const Self as usize, id);
        if HELD_LOCKS.with(|held| held.borrow().contains(&key)) {
            return Err(WorkflowError::IllegalState(format!("workflow {id}: llamada reentrante mientras se despacha")));
        }
        let result = {
            let lock = self.locks.entry(id).or_insert_with(|| Arc::new(Mutex::new(()))).clone();
            let outcome = match lock.lock() {
                Ok(_guard) => {
                    let _held = HeldLock::acquire(key);
                    f()
                }
                Err(e) => Err(WorkflowError::IllegalState(format!("lock del workflow {id} envenenado: {e}"))),
            };
            outcome
        };
        self.locks.remove_if(&id, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    fn listeners(&self) -> Vec<Arc<dyn WorkflowListener>> {
        match self.listeners.read() {
            Ok(l) => l.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Persiste y, si el estado cambió respecto de `previous`, notifica.
    fn commit(&self, workflow: &WorkflowInstance, previous: WorkflowState) -> Result<()> {
        self.repo.update(workflow).inspect_err(|e| error!("workflow {}: no se pudo persistir: {}", workflow.id(), e))?;
        if workflow.state() != previous {
            for listener in self.listeners() {
                listener.state_changed(workflow);
            }
        }
        Ok(())
    }

    fn notify_operation(&self, workflow: &WorkflowInstance) {
        for listener in self.listeners() {
            listener.operation_changed(workflow);
        }
    }

    fn runnable(&self, definition: &WorkflowDefinition, visited: &mut HashSet<String>) -> bool {
        if !visited.insert(definition.id().to_string()) {
            return true;
        }
        definition.operations().iter().all(|op| {
                                           if !self.handlers.contains(op.id()) {
                                               return false;
                                           }
                                           match op.exception_handling_workflow() {
                                               None => true,
                                               Some(id) => match self.definitions.get(id).map(|d| d.value().clone()) {
                                                   Some(handler_def) => self.runnable(&handler_def, visited),
                                                   None => false,
                                               },
                                           }
                                       })
    }

    /// Bucle de despacho. Avanza la instancia hasta una pausa, un estado
    /// terminal o una señal externa. Llamar con el lock de la instancia.
    fn run(&self, mut workflow: WorkflowInstance, mut resume: Option<BTreeMap<String, String>>) -> Result<WorkflowInstance> {
        loop {
            let id = workflow.id();
            if workflow.state().is_terminal() {
                self.signals.remove(&id);
                return Ok(workflow);
            }
            if let Some((_, signal)) = self.signals.remove(&id) {
                return self.apply_signal(workflow, signal);
            }

            let needs_advance = workflow.current_operation().map_or(true, |op| op.state().is_terminal());
            if needs_advance {
                if workflow.next().is_none() {
                    self.finish(&mut workflow)?;
                    continue;
                }
                self.notify_operation(&workflow);
            }

            let (position, op_id, invocation) = match (workflow.current_position(), workflow.current_operation()) {
                (Some(position), Some(op)) => (position, op.id().to_string(), Invocation::for_operation(op, resume.take())),
                _ => return Err(WorkflowError::IllegalState(format!("workflow {id} sin operación actual"))),
            };

            let handler = match self.handlers.get(&op_id) {
                Some(h) => h,
                None => {
                    let msg = format!("no hay handler registrado para la operación '{op_id}'");
                    warn!("workflow {id}: {msg}");
                    self.handle_failure(&mut workflow, position, &msg)?;
                    continue;
                }
            };

            let previous = workflow.state();
            // Tras una pausa dentro del workflow de excepción se sigue en FAILING.
            if previous == WorkflowState::Failing || workflow.is_handling_failure() {
                workflow.set_state(WorkflowState::Failing);
            } else {
                workflow.set_state(WorkflowState::Running);
            }
            if let Some(op) = workflow.current_operation_mut() {
                let started = op.date_started();
                op.set_state(OperationState::Running);
                if matches!(invocation, Invocation::Resume(_)) && started.is_some() {
                    op.restore_dates(started, None);
                }
            }
            self.commit(&workflow, previous)?;
            debug!("workflow {id}: ejecutando '{op_id}' en la posición {position}");

            match worker::invoke(handler.as_ref(), &workflow, &invocation) {
                Ok(result) => {
                    if !self.apply_result(&mut workflow, handler.as_ref(), result)? {
                        return Ok(workflow);
                    }
                }
                Err(e) => {
                    let msg = format!("la operación '{op_id}' falló: {e}");
                    error!("workflow {id}: {msg}");
                    self.handle_failure(&mut workflow, position, &msg)?;
                }
            }
        }
    }

    /// Aplica el resultado del handler. Devuelve falso si el bucle debe
    /// detenerse (pausa).
    fn apply_result(&self,
                    workflow: &mut WorkflowInstance,
                    handler: &dyn WorkflowOperationHandler,
                    result: WorkflowOperationResult)
                    -> Result<bool> {
        let id = workflow.id();
        let (media_package, properties, action, time_in_queue) = result.into_parts();
        if let Some(mp) = media_package {
            workflow.set_media_package(mp);
        }
        if let Some(props) = properties.filter(|p| !p.is_empty()) {
            variables::replace_in_instance(workflow, &props, &self.config.system_properties);
            workflow.configurations_mut().merge(&props);
        }
        let op = workflow.current_operation_mut()
                         .ok_or_else(|| WorkflowError::IllegalState(format!("workflow {id} sin operación actual")))?;
        op.set_time_in_queue(time_in_queue);
        match action {
            Action::Pause => {
                op.set_state(OperationState::Paused);
                op.set_hold_state_user_interface_url(handler.hold_state_user_interface_url());
                op.set_hold_action_title(handler.hold_action_title());
                info!("workflow {id}: en espera en '{}'", op.id());
                let previous = workflow.state();
                workflow.set_state(WorkflowState::Paused);
                self.commit(workflow, previous)?;
                return Ok(false);
            }
            Action::Continue => op.set_state(OperationState::Succeeded),
            Action::Skip => op.set_state(OperationState::Skipped),
        }
        if let Err(e) = handler.destroy(workflow) {
            warn!("workflow {id}: destroy de '{}' falló: {}", handler.id(), e);
        }
        self.advance(workflow)?;
        Ok(true)
    }

    /// Mueve el puntero tras una operación concluida y persiste.
    fn advance(&self, workflow: &mut WorkflowInstance) -> Result<()> {
        let previous = workflow.state();
        if workflow.next().is_none() {
            return self.finish(workflow);
        }
        self.notify_operation(workflow);
        self.commit(workflow, previous)
    }

    /// Lista agotada: `FAILED` si alguna operación falló con
    /// `fail_workflow_on_exception`, `SUCCEEDED` si no.
    fn finish(&self, workflow: &mut WorkflowInstance) -> Result<()> {
        let previous = workflow.state();
        let failed = workflow.operations()
                             .iter()
                             .any(|op| op.state() == OperationState::Failed && op.is_fail_workflow_on_exception());
        workflow.set_state(if failed { WorkflowState::Failed } else { WorkflowState::Succeeded });
        info!("workflow {} terminado: {}", workflow.id(), workflow.state());
        self.commit(workflow, previous)
    }

    fn handle_failure(&self, workflow: &mut WorkflowInstance, position: usize, message: &str) -> Result<()> {
        let id = workflow.id();
        workflow.add_error_message(message);
        let op = workflow.operations_mut()
                         .get_mut(position)
                         .ok_or_else(|| WorkflowError::IllegalState(format!("workflow {id}: posición {position} inválida")))?;
        op.set_state(OperationState::Failed);
        let fail = op.is_fail_workflow_on_exception();
        let handler_workflow = op.exception_handling_workflow().map(str::to_string);

        if !fail {
            return self.advance(workflow);
        }
        let previous = workflow.state();
        // Un fallo dentro del workflow de excepción no vuelve a extender.
        let handler_def = match &handler_workflow {
            Some(hid) if previous != WorkflowState::Failing => self.definitions.get(hid).map(|d| d.value().clone()),
            _ => None,
        };
        if let (Some(hid), None) = (&handler_workflow, &handler_def) {
            warn!("workflow {id}: workflow de excepción '{hid}' no disponible");
        }
        match handler_def {
            Some(def) => {
                info!("workflow {id}: ejecutando workflow de excepción '{}'", def.id());
                workflow.truncate_after(position);
                workflow.extend(&def);
                let config = workflow.configurations().as_map().clone();
                variables::replace_in_instance(workflow, &config, &self.config.system_properties);
                workflow.set_state(WorkflowState::Failing);
                if workflow.next().is_none() {
                    return self.finish(workflow);
                }
                self.notify_operation(workflow);
                self.commit(workflow, previous)
            }
            None => {
                workflow.set_state(WorkflowState::Failed);
                self.commit(workflow, previous)
            }
        }
    }

    fn destroy_current(&self, workflow: &WorkflowInstance) {
        if let Some(op) = workflow.current_operation() {
            if let Some(handler) = self.handlers.get(op.id()) {
                if let Err(e) = handler.destroy(workflow) {
                    warn!("workflow {}: destroy de '{}' falló: {}", workflow.id(), op.id(), e);
                }
            }
        }
    }

    fn apply_signal(&self, mut workflow: WorkflowInstance, signal: ControlSignal) -> Result<WorkflowInstance> {
        let previous = workflow.state();
        match signal {
            ControlSignal::Stop => {
                self.destroy_current(&workflow);
                workflow.set_state(WorkflowState::Stopped);
            }
            ControlSignal::Suspend => workflow.set_state(WorkflowState::Paused),
        }
        info!("workflow {}: {} -> {}", workflow.id(), previous, workflow.state());
        self.commit(&workflow, previous)?;
        Ok(workflow)
    }

    /// Deja la señal para un bucle en curso y, con el lock, la aplica si
    /// nadie la consumió.
    fn control(&self, id: u64, signal: ControlSignal, target: WorkflowState) -> Result<WorkflowInstance> {
        self.signals.insert(id, signal);
        let result = self.with_instance_lock(id, || {
                             self.signals.remove(&id);
                             let workflow = self.repo.get_workflow_by_id(id)?;
                             let state = workflow.state();
                             if state == target {
                                 Ok(workflow)
                             } else if state.is_terminal() {
                                 Err(WorkflowError::IllegalState(format!("workflow {id} ya terminó en {state}")))
                             } else {
                                 self.apply_signal(workflow, signal)
                             }
                         });
        self.signals.remove(&id);
        result
    }
}

impl<R> WorkflowService for WorkflowServiceImpl<R> where R: WorkflowRepository
{
    fn register_workflow_definition(&self, definition: WorkflowDefinition) -> Result<()> {
        if definition.id().trim().is_empty() {
            return Err(WorkflowError::InvalidArgument("la definición requiere un id".into()));
        }
        if definition.operations().is_empty() {
            return Err(WorkflowError::InvalidArgument(format!("la definición '{}' no tiene operaciones",
                                                              definition.id())));
        }
        match self.definitions.entry(definition.id().to_string()) {
            Entry::Occupied(_) => {
                Err(WorkflowError::IllegalState(format!("ya existe una definición con id '{}'", definition.id())))
            }
            Entry::Vacant(slot) => {
                info!("definición registrada: {}", definition.id());
                slot.insert(definition);
                Ok(())
            }
        }
    }

    fn unregister_workflow_definition(&self, id: &str) -> Result<WorkflowDefinition> {
        self.definitions
            .remove(id)
            .map(|(_, d)| d)
            .ok_or(WorkflowError::NotFound(format!("definición {}", id)))
    }

    fn get_workflow_definition_by_id(&self, id: &str) -> Result<WorkflowDefinition> {
        self.definitions
            .get(id)
            .map(|d| d.value().clone())
            .ok_or(WorkflowError::NotFound(format!("definición {}", id)))
    }

    fn list_available_workflow_definitions(&self) -> Result<Vec<WorkflowDefinition>> {
        let mut all: Vec<WorkflowDefinition> = self.definitions.iter().map(|d| d.value().clone()).collect();
        all.retain(|d| self.is_runnable(d));
        all.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(all)
    }

    fn is_runnable(&self, definition: &WorkflowDefinition) -> bool {
        self.runnable(definition, &mut HashSet::new())
    }

    fn get_workflow_by_id(&self, id: u64) -> Result<WorkflowInstance> {
        self.repo.get_workflow_by_id(id)
    }

    fn get_workflow_instances(&self, query: &WorkflowQuery) -> Result<WorkflowSet> {
        self.repo.get_workflow_instances(query)
    }

    fn start_with_parent(&self,
                         definition: &WorkflowDefinition,
                         media_package: MediaPackage,
                         parent_id: Option<u64>,
                         properties: Option<BTreeMap<String, String>>)
                         -> Result<WorkflowInstance> {
        if let Some(parent) = parent_id {
            self.repo.get_workflow_by_id(parent)?;
        }
        let properties = properties.unwrap_or_default();
        let mut workflow = WorkflowInstance::new(definition, media_package, parent_id, Some(&properties))?;
        let id = self.repo.next_workflow_id()?;
        workflow.set_id(id);
        variables::replace_in_instance(&mut workflow, &properties, &self.config.system_properties);
        info!("workflow {} creado desde '{}'", id, definition.id());
        self.with_instance_lock(id, move || {
                self.commit(&workflow, WorkflowState::Instantiated)?;
                self.run(workflow, None)
            })
    }

    fn start_default(&self,
                     media_package: MediaPackage,
                     properties: Option<BTreeMap<String, String>>)
                     -> Result<WorkflowInstance> {
        let id = self.selection
                     .select(&media_package, properties.as_ref())
                     .ok_or_else(|| WorkflowError::Configuration("no hay definición por defecto".into()))?;
        let definition = self.get_workflow_definition_by_id(&id)?;
        self.start(&definition, media_package, properties)
    }

    fn stop(&self, id: u64) -> Result<WorkflowInstance> {
        self.control(id, ControlSignal::Stop, WorkflowState::Stopped)
    }

    fn suspend(&self, id: u64) -> Result<WorkflowInstance> {
        self.control(id, ControlSignal::Suspend, WorkflowState::Paused)
    }

    fn resume_with(&self, id: u64, properties: &BTreeMap<String, String>) -> Result<WorkflowInstance> {
        self.with_instance_lock(id, || {
                let mut workflow = self.repo.get_workflow_by_id(id)?;
                if workflow.state() != WorkflowState::Paused {
                    return Err(WorkflowError::IllegalState(format!("workflow {id} no está en pausa ({})",
                                                                   workflow.state())));
                }
                if !properties.is_empty() {
                    variables::replace_in_instance(&mut workflow, properties, &self.config.system_properties);
                    workflow.configurations_mut().merge(properties);
                }
                info!("workflow {id}: reanudado");
                self.run(workflow, Some(properties.clone()))
            })
    }

    fn update(&self, workflow: &WorkflowInstance) -> Result<()> {
        self.with_instance_lock(workflow.id(), || self.repo.update(workflow))
    }

    fn remove(&self, id: u64) -> Result<()> {
        self.with_instance_lock(id, || self.repo.remove(id))?;
        info!("workflow {id} eliminado");
        Ok(())
    }

    fn count_workflow_instances_by(&self, state: Option<WorkflowState>, operation: Option<&str>) -> Result<u64> {
        self.repo.count_workflow_instances(state, operation)
    }

    fn statistics(&self) -> Result<WorkflowStatistics> {
        self.repo.get_statistics()
    }

    fn add_workflow_listener(&self, listener: Arc<dyn WorkflowListener>) {
        match self.listeners.write() {
            Ok(mut l) => l.push(listener),
            Err(poisoned) => poisoned.into_inner().push(listener),
        }
    }

    fn remove_workflow_listener(&self, listener: &Arc<dyn WorkflowListener>) {
        let target = Arc::as_ptr(listener) as *const ();
        let retain = |l: &Arc<dyn WorkflowListener>| Arc::as_ptr(l) as *const () != target;
        match self.listeners.write() {
            Ok(mut l) => l.retain(retain),
            Err(poisoned) => poisoned.into_inner().retain(retain),
        }
    }
}
