// Archivo: variables.rs
// Propósito: sustitución de marcadores `${clave}` en configuraciones y
// condiciones.
use std::collections::BTreeMap;
use workflow_api::{Configurable, WorkflowInstance};

/// Reemplaza cada `${clave}` por su valor en `properties` o, en su defecto,
/// en `system`. Las claves desconocidas quedan intactas.
pub fn substitute(text: &str, properties: &BTreeMap<String, String>, system: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match properties.get(key).or_else(|| system.get(key)) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("${");
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Aplica la sustitución a la configuración de la instancia y a la
/// configuración y condiciones de cada operación.
pub fn replace_in_instance(workflow: &mut WorkflowInstance,
                           properties: &BTreeMap<String, String>,
                           system: &BTreeMap<String, String>) {
    workflow.configurations_mut().map_values(|v| substitute(v, properties, system));
    for op in workflow.operations_mut() {
        op.configurations_mut().map_values(|v| substitute(v, properties, system));
        let execution = op.execution_condition().map(|c| substitute(c, properties, system));
        op.set_execution_condition(execution);
        let skip = op.skip_condition().map(|c| substitute(c, properties, system));
        op.set_skip_condition(skip);
    }
}
