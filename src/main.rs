use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use media_package::MediaPackage;
use tracing_subscriber::EnvFilter;
use workflow_api::{ContinuingOperationHandler, ResumableOperationHandler, WorkflowQuery, WorkflowService};
use workflow_persistence::DieselWorkflowRepository;
use workflow_service::{WorkflowServiceConfig, WorkflowServiceImpl};

/// Pequeño menú interactivo para operar el motor de workflows sobre el
/// repositorio SQLite de `workflow-persistence`.
///
/// Opciones soportadas:
/// 1) Ver definiciones disponibles
/// 2) Iniciar un workflow
/// 3) Ver instancias (id, estado, operación actual)
/// 4) Reanudar una instancia pausada
/// 5) Detener una instancia
/// 6) Mostrar el XML de una instancia
/// 7) Salir
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
                             .init();

    let mut config = WorkflowServiceConfig::from_env()?;
    if config.definitions_dir.is_none() {
        config.definitions_dir = Some(PathBuf::from("etc/workflows"));
    }
    // Inicializar repo (aplica migraciones embebidas si procede)
    let repo = Arc::new(workflow_persistence::new_from_env()?);
    let service: WorkflowServiceImpl<DieselWorkflowRepository> = WorkflowServiceImpl::new(repo, config)?;
    register_demo_handlers(&service);
    log::info!("servicio de workflows listo ({} definiciones)", service.list_available_workflow_definitions()?.len());

    loop {
        println!("\n== Workflow CLI menu ==");
        println!("1) Ver definiciones disponibles");
        println!("2) Iniciar workflow");
        println!("3) Ver instancias");
        println!("4) Reanudar instancia");
        println!("5) Detener instancia");
        println!("6) Mostrar XML de una instancia");
        println!("7) Salir");
        print!("Elige una opción: ");
        io::stdout().flush().ok();

        let mut choice = String::new();
        io::stdin().read_line(&mut choice)?;
        match choice.trim() {
            "1" => match service.list_available_workflow_definitions() {
                Ok(defs) => {
                    println!("\nID                   | EJECUTABLE | TÍTULO");
                    println!("---------------------------------------------------------");
                    for d in defs {
                        let runnable = service.is_runnable(&d);
                        println!("{:<20} | {:<10} | {}", d.id(), runnable, d.title().unwrap_or("<sin título>"));
                    }
                }
                Err(e) => eprintln!("Error listando definiciones: {}", e),
            },
            "2" => {
                let def_id = prompt("Id de la definición: ")?;
                let definition = match service.get_workflow_definition_by_id(def_id.trim()) {
                    Ok(d) => d,
                    Err(e) => {
                        eprintln!("{}", e);
                        continue;
                    }
                };
                let title = prompt("Título de la grabación (enter para vacío): ")?;
                let mut mp = MediaPackage::new();
                if !title.trim().is_empty() {
                    mp.set_title(Some(title.trim().to_string()));
                }
                let props = prompt("Propiedades clave=valor separadas por coma (enter para ninguna): ")?;
                match service.start(&definition, mp, parse_properties(&props)) {
                    Ok(wf) => println!("Workflow {} en estado {}", wf.id(), wf.state()),
                    Err(e) => eprintln!("Error iniciando workflow: {}", e),
                }
            }
            "3" => match service.get_workflow_instances(&WorkflowQuery::new().with_count(50)) {
                Ok(set) => {
                    println!("\nID     | ESTADO       | OPERACIÓN ACTUAL");
                    println!("---------------------------------------------");
                    for wf in set.items {
                        let current = wf.current_operation().map(|op| op.id().to_string()).unwrap_or_else(|| "-".into());
                        println!("{:<6} | {:<12} | {}", wf.id(), wf.state(), current);
                    }
                }
                Err(e) => eprintln!("Error listando instancias: {}", e),
            },
            "4" => {
                let Some(id) = prompt_id("Id de la instancia a reanudar: ")? else {
                    continue;
                };
                let props = prompt("Propiedades clave=valor separadas por coma (enter para ninguna): ")?;
                let props = parse_properties(&props).unwrap_or_default();
                match service.resume_with(id, &props) {
                    Ok(wf) => println!("Workflow {} en estado {}", wf.id(), wf.state()),
                    Err(e) => eprintln!("Error reanudando: {}", e),
                }
            }
            "5" => {
                let Some(id) = prompt_id("Id de la instancia a detener: ")? else {
                    continue;
                };
                match service.stop(id) {
                    Ok(wf) => println!("Workflow {} en estado {}", wf.id(), wf.state()),
                    Err(e) => eprintln!("Error deteniendo: {}", e),
                }
            }
            "6" => {
                let Some(id) = prompt_id("Id de la instancia: ")? else {
                    continue;
                };
                match service.get_workflow_by_id(id).and_then(|wf| service.builder().to_xml_instance(&wf)) {
                    Ok(xml) => println!("{}", xml),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            "7" => {
                println!("Saliendo...");
                break;
            }
            other => {
                println!("Opción inválida: {}", other);
            }
        }
    }

    Ok(())
}

/// Handlers de la definición de demostración en `etc/workflows`.
fn register_demo_handlers(service: &WorkflowServiceImpl<DieselWorkflowRepository>) {
    service.register_handler(Arc::new(ContinuingOperationHandler::new("inspect", "Inspecciona el paquete")));
    service.register_handler(Arc::new(ContinuingOperationHandler::new("publish", "Publica la grabación")));
    let review = ResumableOperationHandler::new("review", "Revisión manual").with_hold_state_ui(service.hold_states(),
                                                                                               "review.html",
                                                                                               "Aprobar");
    service.register_handler(Arc::new(review));
}

fn parse_properties(input: &str) -> Option<BTreeMap<String, String>> {
    let props: BTreeMap<String, String> = input.split(',')
                                               .filter_map(|pair| pair.split_once('='))
                                               .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                                               .filter(|(k, _)| !k.is_empty())
                                               .collect();
    if props.is_empty() {
        None
    } else {
        Some(props)
    }
}

fn prompt_id(msg: &str) -> io::Result<Option<u64>> {
    let s = prompt(msg)?;
    match s.trim().parse() {
        Ok(id) => Ok(Some(id)),
        Err(_) => {
            eprintln!("Id inválido");
            Ok(None)
        }
    }
}

fn prompt(msg: &str) -> io::Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s)
}
