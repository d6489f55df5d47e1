// Archivo: definitions.rs
// Propósito: carga de definiciones de workflow desde un directorio de
// documentos XML.
use log::{debug, warn};
use std::fs;
use std::path::Path;
use workflow_api::{Result, WorkflowBuilder, WorkflowDefinition, WorkflowError};

/// Lee todos los `*.xml` de `dir` en orden de nombre. Un documento puede
/// contener una `definition` o una lista `definitions`.
pub fn load_definitions(dir: &Path, builder: &WorkflowBuilder) -> Result<Vec<WorkflowDefinition>> {
    let entries = fs::read_dir(dir).map_err(|e| {
                                       WorkflowError::Configuration(format!("no se puede leer {}: {}", dir.display(), e))
                                   })?;
    let mut paths: Vec<_> = entries.filter_map(|e| e.ok())
                                   .map(|e| e.path())
                                   .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("xml")))
                                   .collect();
    paths.sort();

    let mut definitions = Vec::new();
    for path in paths {
        let xml = fs::read_to_string(&path).map_err(|e| {
                                               WorkflowError::Configuration(format!("no se puede leer {}: {}",
                                                                                    path.display(),
                                                                                    e))
                                           })?;
        if xml.contains("<definitions") {
            let mut list = builder.parse_workflow_definitions(&xml)?;
            debug!("{}: {} definiciones", path.display(), list.len());
            definitions.append(&mut list);
        } else {
            let def = builder.parse_workflow_definition(&xml)
                             .inspect_err(|e| warn!("{}: documento inválido: {}", path.display(), e))?;
            debug!("{}: definición '{}'", path.display(), def.id());
            definitions.push(def);
        }
    }
    Ok(definitions)
}
