// Archivo: repository.rs
// Propósito: contrato de persistencia de instancias de workflow. Lo
// implementan el store en memoria (`stubs`) y el store SQLite.
use crate::errors::Result;
use crate::instance::{WorkflowInstance, WorkflowState};
use crate::query::{WorkflowQuery, WorkflowSet};
use crate::statistics::WorkflowStatistics;

/// Almacén de instancias. Todo fallo de almacenamiento se expresa como
/// `WorkflowError::Database`; una búsqueda sin resultado es `NotFound`.
pub trait WorkflowRepository: Send + Sync {
    /// Carga una instancia por id, ya rehidratada con `init()`.
    fn get_workflow_by_id(&self, id: u64) -> Result<WorkflowInstance>;

    /// Inserta o reemplaza la instancia completa.
    fn update(&self, workflow: &WorkflowInstance) -> Result<()>;

    /// Elimina la instancia; `NotFound` si no existía.
    fn remove(&self, id: u64) -> Result<()>;

    fn get_workflow_instances(&self, query: &WorkflowQuery) -> Result<WorkflowSet>;

    /// Cuenta instancias, opcionalmente filtradas por estado y por id de la
    /// operación actual.
    fn count_workflow_instances(&self, state: Option<WorkflowState>, operation: Option<&str>) -> Result<u64>;

    /// Reserva el siguiente id numérico.
    fn next_workflow_id(&self) -> Result<u64>;

    fn get_statistics(&self) -> Result<WorkflowStatistics> {
        let all = self.get_workflow_instances(&WorkflowQuery::new())?;
        Ok(WorkflowStatistics::from_instances(&all.items))
    }
}
