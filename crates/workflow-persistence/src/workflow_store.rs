use crate::schema;
use crate::schema::workflows::dsl as wf_dsl;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::result::Error as DieselError;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::{Arc, Mutex, MutexGuard};
use workflow_api::{WorkflowBuilder, WorkflowError, WorkflowInstance, WorkflowQuery, WorkflowRepository, WorkflowSet,
                   WorkflowState};
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");
type DbPool = Pool<ConnectionManager<SqliteConnection>>;
type Result<T> = std::result::Result<T, WorkflowError>;
/// Ajustes por conexión: cada conexión nueva del pool espera al lock de
/// escritura en vez de fallar en el acto.
#[derive(Debug)]
struct SqlitePragmas;
impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
  fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), diesel::r2d2::Error> {
    diesel::sql_query("PRAGMA busy_timeout = 5000;").execute(conn).map_err(diesel::r2d2::Error::QueryError)?;
    Ok(())
  }
}
/// Repo Diesel que implementa `WorkflowRepository`. Cada instancia se guarda
/// como documento XML junto a columnas de consulta.
pub struct DieselWorkflowRepository {
  pool: Arc<DbPool>,
  builder: WorkflowBuilder,
  last_id: Mutex<u64>,
}
#[derive(Debug, Insertable)]
#[diesel(table_name = schema::workflows)]
struct WorkflowRow {
  pub id: i64,
  pub state: String,
  pub template: Option<String>,
  pub current_operation: Option<String>,
  pub parent_id: Option<i64>,
  pub xml: String,
}
fn map_db_err(e: DieselError) -> WorkflowError {
  WorkflowError::Database(e.to_string())
}
/// Los ids son `u64` en el modelo y `BIGINT` en SQLite.
fn to_db_id(id: u64) -> Result<i64> {
  i64::try_from(id).map_err(|_| WorkflowError::InvalidArgument(format!("id {} fuera de rango", id)))
}
fn is_in_memory(url: &str) -> bool {
  url == ":memory:" || url.contains("mode=memory")
}
impl DieselWorkflowRepository {
  /// Abre (o crea) la base en `database_url` y aplica las migraciones
  /// pendientes. Una base en memoria usa una sola conexión para que todas
  /// las operaciones vean las mismas tablas.
  pub fn new(database_url: &str) -> Result<Self> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let max_size = if is_in_memory(database_url) { 1 } else { 4 };
    let pool = Pool::builder().max_size(max_size)
                              .connection_customizer(Box::new(SqlitePragmas))
                              .build(manager)
                              .map_err(|e| WorkflowError::Database(format!("pool: {}", e)))?;
    let repo = DieselWorkflowRepository { pool: Arc::new(pool),
                                          builder: WorkflowBuilder::new().without_declaration(),
                                          last_id: Mutex::new(0) };
    {
      let mut c = repo.conn()?;
      if !is_in_memory(database_url) {
        let _ = diesel::sql_query("PRAGMA journal_mode = WAL;").execute(&mut c);
      }
      c.run_pending_migrations(MIGRATIONS)
       .map_err(|e| WorkflowError::Database(format!("migraciones: {}", e)))?;
      let max: Option<i64> = wf_dsl::workflows.select(diesel::dsl::max(wf_dsl::id))
                                              .first(&mut c)
                                              .map_err(map_db_err)?;
      *repo.lock_last_id()? = max.unwrap_or(0).max(0) as u64;
    }
    log::info!("repositorio de workflows abierto en {}", database_url);
    Ok(repo)
  }
  fn conn(&self) -> Result<PooledConnection<ConnectionManager<SqliteConnection>>> {
    self.pool.get().map_err(|e| WorkflowError::Database(format!("pool: {}", e)))
  }
  fn lock_last_id(&self) -> Result<MutexGuard<'_, u64>> {
    self.last_id.lock().map_err(|e| WorkflowError::Database(format!("mutex poisoned: {:?}", e)))
  }
  fn to_row(&self, workflow: &WorkflowInstance) -> Result<WorkflowRow> {
    let parent_id = workflow.parent_id().map(to_db_id).transpose()?;
    Ok(WorkflowRow { id: to_db_id(workflow.id())?,
                     state: workflow.state().as_str().to_string(),
                     template: workflow.template().map(str::to_string),
                     current_operation: workflow.current_operation().map(|op| op.id().to_string()),
                     parent_id,
                     xml: self.builder.to_xml_instance(workflow)? })
  }
}
impl WorkflowRepository for DieselWorkflowRepository {
  fn get_workflow_by_id(&self, id: u64) -> Result<WorkflowInstance> {
    let db_id = to_db_id(id)?;
    let mut conn = self.conn()?;
    let xml: Option<String> = wf_dsl::workflows.find(db_id)
                                               .select(wf_dsl::xml)
                                               .first(&mut conn)
                                               .optional()
                                               .map_err(map_db_err)?;
    match xml {
      Some(xml) => self.builder.parse_workflow_instance(&xml),
      None => Err(WorkflowError::NotFound(format!("workflow {}", id))),
    }
  }

  fn update(&self, workflow: &WorkflowInstance) -> Result<()> {
    let row = self.to_row(workflow)?;
    let mut conn = self.conn()?;
    diesel::replace_into(wf_dsl::workflows).values(&row).execute(&mut conn).map_err(map_db_err)?;
    let mut last = self.lock_last_id()?;
    if workflow.id() > *last {
      *last = workflow.id();
    }
    Ok(())
  }

  fn remove(&self, id: u64) -> Result<()> {
    let db_id = to_db_id(id)?;
    let mut conn = self.conn()?;
    let deleted = diesel::delete(wf_dsl::workflows.find(db_id)).execute(&mut conn).map_err(map_db_err)?;
    if deleted == 0 {
      return Err(WorkflowError::NotFound(format!("workflow {}", id)));
    }
    Ok(())
  }

  fn get_workflow_instances(&self, query: &WorkflowQuery) -> Result<WorkflowSet> {
    let mut conn = self.conn()?;
    let documents: Vec<String> =
      wf_dsl::workflows.select(wf_dsl::xml).order(wf_dsl::id.asc()).load(&mut conn).map_err(map_db_err)?;
    let mut instances = Vec::with_capacity(documents.len());
    for xml in &documents {
      instances.push(self.builder.parse_workflow_instance(xml)?);
    }
    Ok(query.apply(instances))
  }

  fn count_workflow_instances(&self, state: Option<WorkflowState>, operation: Option<&str>) -> Result<u64> {
    let mut conn = self.conn()?;
    let mut q = wf_dsl::workflows.select(diesel::dsl::count_star()).into_boxed();
    if let Some(s) = state {
      q = q.filter(wf_dsl::state.eq(s.as_str()));
    }
    if let Some(op) = operation {
      q = q.filter(wf_dsl::current_operation.eq(op.to_string()));
    }
    let n: i64 = q.first(&mut conn).map_err(map_db_err)?;
    Ok(n.max(0) as u64)
  }

  fn next_workflow_id(&self) -> Result<u64> {
    let mut last = self.lock_last_id()?;
    *last += 1;
    Ok(*last)
  }
}
/// Construye el repositorio desde el entorno: `WORKFLOW_DB_URL`, luego
/// `DATABASE_URL`, y si no hay ninguna un fichero local `workflow.db`.
pub fn new_from_env() -> Result<DieselWorkflowRepository> {
  dotenvy::dotenv().ok();
  let url = std::env::var("WORKFLOW_DB_URL").or_else(|_| std::env::var("DATABASE_URL"))
                                            .unwrap_or_else(|_| "workflow.db".into());
  DieselWorkflowRepository::new(&url)
}
