// Archivo: service.rs
// Propósito: contrato del servicio de workflows que orquesta creación,
// avance, pausa, parada y consulta de instancias.
use crate::definition::WorkflowDefinition;
use crate::errors::Result;
use crate::instance::{WorkflowInstance, WorkflowState};
use crate::listener::WorkflowListener;
use crate::query::{WorkflowQuery, WorkflowSet};
use crate::statistics::WorkflowStatistics;
use media_package::MediaPackage;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Servicio de workflows.
///
/// `start` y `resume` ejecutan el bucle de despacho en el hilo llamador y
/// devuelven la instancia tal como quedó al salir del bucle (en pausa,
/// terminada o fallida). `stop` y `suspend` pueden llamarse desde otro hilo
/// mientras el bucle avanza; el cambio se aplica en el siguiente límite de
/// operación.
pub trait WorkflowService: Send + Sync {
    /// Registra una definición; `IllegalState` si el id ya existe.
    fn register_workflow_definition(&self, definition: WorkflowDefinition) -> Result<()>;

    fn unregister_workflow_definition(&self, id: &str) -> Result<WorkflowDefinition>;

    /// `NotFound` si no hay definición con ese id.
    fn get_workflow_definition_by_id(&self, id: &str) -> Result<WorkflowDefinition>;

    /// Definiciones cuyas operaciones resuelven todas a un handler, por id.
    fn list_available_workflow_definitions(&self) -> Result<Vec<WorkflowDefinition>>;

    fn is_runnable(&self, definition: &WorkflowDefinition) -> bool;

    fn get_workflow_by_id(&self, id: u64) -> Result<WorkflowInstance>;

    fn get_workflow_instances(&self, query: &WorkflowQuery) -> Result<WorkflowSet>;

    fn start(&self,
             definition: &WorkflowDefinition,
             media_package: MediaPackage,
             properties: Option<BTreeMap<String, String>>)
             -> Result<WorkflowInstance> {
        self.start_with_parent(definition, media_package, None, properties)
    }

    /// Crea la instancia enlazada a `parent_id` y la avanza.
    fn start_with_parent(&self,
                         definition: &WorkflowDefinition,
                         media_package: MediaPackage,
                         parent_id: Option<u64>,
                         properties: Option<BTreeMap<String, String>>)
                         -> Result<WorkflowInstance>;

    /// Arranca con la definición elegida por la estrategia de selección.
    fn start_default(&self,
                     media_package: MediaPackage,
                     properties: Option<BTreeMap<String, String>>)
                     -> Result<WorkflowInstance>;

    fn stop(&self, id: u64) -> Result<WorkflowInstance>;

    fn suspend(&self, id: u64) -> Result<WorkflowInstance>;

    fn resume(&self, id: u64) -> Result<WorkflowInstance> {
        self.resume_with(id, &BTreeMap::new())
    }

    /// Fusiona `properties` en la configuración y reanuda en la misma
    /// operación en la que se detuvo.
    fn resume_with(&self, id: u64, properties: &BTreeMap<String, String>) -> Result<WorkflowInstance>;

    /// Persiste la instancia completa.
    fn update(&self, workflow: &WorkflowInstance) -> Result<()>;

    fn remove(&self, id: u64) -> Result<()>;

    fn count_workflow_instances(&self) -> Result<u64> {
        self.count_workflow_instances_by(None, None)
    }

    fn count_workflow_instances_by(&self, state: Option<WorkflowState>, operation: Option<&str>) -> Result<u64>;

    fn statistics(&self) -> Result<WorkflowStatistics>;

    fn add_workflow_listener(&self, listener: Arc<dyn WorkflowListener>);

    fn remove_workflow_listener(&self, listener: &Arc<dyn WorkflowListener>);
}
