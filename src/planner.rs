//! Harvest, graph construction and scheduling in one call.

use crate::analysis::topology::schedule_with;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::graph::{build_graph, DependencyGraph, Edge};
use crate::harvest::{Factory, Harvester};
use crate::store::{DependencyRecord, FuncRef, Path};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Everything needed to run a factory's calculations in a valid order.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub records: Vec<DependencyRecord>,
    pub order: Vec<FuncRef>,
    pub graph: DependencyGraph,
}

#[derive(Serialize)]
struct PlanExport<'a> {
    records: &'a [DependencyRecord],
    order: &'a [FuncRef],
    edges: Vec<EdgeExport<'a>>,
}

#[derive(Serialize, PartialEq, Eq, PartialOrd, Ord)]
struct EdgeExport<'a> {
    source: &'a Path,
    target: &'a Path,
    kind: Edge,
}

impl ExecutionPlan {
    /// Records, order and edges as JSON. Edges are sorted.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut edges: Vec<EdgeExport<'_>> = self
            .graph
            .edges()
            .map(|(source, target, kind)| EdgeExport { source, target, kind })
            .collect();
        edges.sort();
        serde_json::to_string_pretty(&PlanExport {
            records: &self.records,
            order: &self.order,
            edges,
        })
    }

    /// Records in execution order, grouped per function. Functions that
    /// write nothing are not included.
    pub fn ordered_records(&self) -> impl Iterator<Item = &DependencyRecord> + '_ {
        let mut by_func: HashMap<usize, Vec<&DependencyRecord>> = HashMap::new();
        for record in self.records.iter().filter(|r| !r.is_probe()) {
            by_func.entry(record.func.index).or_default().push(record);
        }
        self.order
            .iter()
            .flat_map(move |f| by_func.remove(&f.index).unwrap_or_default())
    }
}

/// Validates `config`, harvests `factory`, builds its graph and schedules it.
pub fn plan(factory: &Factory, config: &EngineConfig) -> Result<ExecutionPlan> {
    config.validate()?;
    let records = Harvester::new(config).harvest_funcs_factory(factory)?;
    let graph = build_graph(&records);
    let order = schedule_with(&graph, config.tie_break)?;
    debug!("Planned factory '{}': {} function(s) in order", factory.name(), order.len());
    Ok(ExecutionPlan { records, order, graph })
}
