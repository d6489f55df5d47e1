// Archivo: statistics.rs
// Propósito: recuentos de instancias por estado, por definición y por
// operación actual.
use crate::instance::{WorkflowInstance, WorkflowState};
use std::collections::BTreeMap;

/// Recuento por estado de workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateCounts(BTreeMap<WorkflowState, u64>);

impl StateCounts {
    pub fn get(&self, state: WorkflowState) -> u64 {
        self.0.get(&state).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    fn increment(&mut self, state: WorkflowState) {
        *self.0.entry(state).or_insert(0) += 1;
    }

    pub fn iter(&self) -> impl Iterator<Item = (WorkflowState, u64)> + '_ {
        self.0.iter().map(|(s, c)| (*s, *c))
    }
}

/// Instancias cuya operación actual es `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationReport {
    pub id: String,
    pub counts: StateCounts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowDefinitionReport {
    pub id: String,
    pub counts: StateCounts,
    pub operations: Vec<OperationReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowStatistics {
    pub counts: StateCounts,
    pub definitions: Vec<WorkflowDefinitionReport>,
}

impl WorkflowStatistics {
    pub fn from_instances<'a, I>(workflows: I) -> Self
        where I: IntoIterator<Item = &'a WorkflowInstance>
    {
        let mut counts = StateCounts::default();
        let mut per_def: BTreeMap<String, (StateCounts, BTreeMap<String, StateCounts>)> = BTreeMap::new();
        for wf in workflows {
            counts.increment(wf.state());
            let template = wf.template().unwrap_or("").to_string();
            let (def_counts, ops) = per_def.entry(template).or_default();
            def_counts.increment(wf.state());
            if let Some(op) = wf.current_operation() {
                ops.entry(op.id().to_string()).or_default().increment(wf.state());
            }
        }
        let definitions = per_def.into_iter()
                                 .map(|(id, (counts, ops))| WorkflowDefinitionReport { id,
                                                                                        counts,
                                                                                        operations: ops.into_iter()
                                                                                                       .map(|(id, counts)| OperationReport { id, counts })
                                                                                                       .collect() })
                                 .collect();
        Self { counts, definitions }
    }

    pub fn total(&self) -> u64 {
        self.counts.total()
    }

    pub fn count(&self, state: WorkflowState) -> u64 {
        self.counts.get(state)
    }
}
