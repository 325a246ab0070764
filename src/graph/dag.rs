//! dag.rs
//! Builds the path-level dependency graph from harvested records and answers
//! reachability queries over it.

use super::edge::Edge;
use super::node::{PathNode, TargetConflict};
use crate::analysis::prefixes::gen_all_prefix_pairs;
use crate::store::{DependencyRecord, FuncRef, Path};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

/// Directed graph over paths. Edges point from what is read to what is
/// produced, and from every container to its members.
///
/// Built once by [`build_graph`] and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    pub(crate) graph: DiGraph<PathNode, Edge>,
    index: HashMap<Path, NodeIndex>,
    records: Vec<DependencyRecord>,
    probes: Vec<FuncRef>,
    conflicts: Vec<TargetConflict>,
}

/// Builds the graph for a full ordered collection of records. Never fails.
///
/// When two functions claim the same target the last declared one owns it;
/// the clash is kept in [`DependencyGraph::conflicts`]. A source equal to its
/// own target (an in-place update) adds no edge.
pub fn build_graph(records: &[DependencyRecord]) -> DependencyGraph {
    let mut graph = DependencyGraph::default();
    for record in records {
        graph.add_record(record);
    }
    graph.records = records.to_vec();
    debug!(
        "Built dependency graph: {} node(s), {} edge(s) from {} record(s)",
        graph.node_count(),
        graph.edge_count(),
        records.len()
    );
    graph
}

impl DependencyGraph {
    fn add_record(&mut self, record: &DependencyRecord) {
        let target = match &record.target {
            Some(target) => target,
            None => {
                // Probes still pull their sources into the graph.
                for source in &record.sources {
                    self.materialize(source);
                }
                if !self.probes.contains(&record.func) {
                    self.probes.push(record.func.clone());
                }
                return;
            }
        };

        let t_idx = self.materialize(target);
        self.claim(t_idx, &record.func);

        for source in &record.sources {
            let s_idx = self.materialize(source);
            if s_idx != t_idx {
                self.connect(s_idx, t_idx, Edge::Data);
            }
        }
    }

    fn claim(&mut self, idx: NodeIndex, func: &FuncRef) {
        let node = &mut self.graph[idx];
        match node.owner.replace(func.clone()) {
            Some(previous) if previous != *func => {
                warn!(
                    "Target '{}' claimed by both '{}' and '{}'; keeping the later one",
                    node.path, previous, func
                );
                self.conflicts.push(TargetConflict {
                    target: node.path.clone(),
                    overridden: previous,
                    winner: func.clone(),
                });
            }
            _ => {}
        }
    }

    /// Adds the node for `path` plus its whole ancestor chain.
    fn materialize(&mut self, path: &Path) -> NodeIndex {
        if let Some(&idx) = self.index.get(path) {
            return idx;
        }
        let idx = self.node_index(path);
        for (child, parent) in gen_all_prefix_pairs(path) {
            let c_idx = self.node_index(&child);
            let p_idx = self.node_index(&parent);
            self.connect(p_idx, c_idx, Edge::Ancestry);
        }
        idx
    }

    fn node_index(&mut self, path: &Path) -> NodeIndex {
        if let Some(&idx) = self.index.get(path) {
            return idx;
        }
        let idx = self.graph.add_node(PathNode::new(path.clone()));
        self.index.insert(path.clone(), idx);
        idx
    }

    /// Parallel edges collapse; `Data` wins over `Ancestry`.
    fn connect(&mut self, from: NodeIndex, to: NodeIndex, kind: Edge) {
        match self.graph.find_edge(from, to) {
            Some(e) => {
                if kind == Edge::Data {
                    self.graph[e] = Edge::Data;
                }
            }
            None => {
                self.graph.add_edge(from, to, kind);
            }
        }
    }

    // --- Accessors ---

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.index.contains_key(path)
    }

    pub fn conflicts(&self) -> &[TargetConflict] {
        &self.conflicts
    }

    pub fn probes(&self) -> &[FuncRef] {
        &self.probes
    }

    /// The records the graph was built from, in declaration order.
    pub fn records(&self) -> &[DependencyRecord] {
        &self.records
    }

    pub(crate) fn index_of(&self, path: &Path) -> Option<NodeIndex> {
        self.index.get(path).copied()
    }

    pub fn node(&self, path: &Path) -> Option<&PathNode> {
        self.index.get(path).map(|&idx| &self.graph[idx])
    }

    pub fn owner(&self, path: &Path) -> Option<&FuncRef> {
        self.node(path).and_then(|n| n.owner.as_ref())
    }

    /// Functions owning at least one node, by declaration index.
    pub fn owners(&self) -> Vec<FuncRef> {
        let set: BTreeSet<&FuncRef> = self
            .graph
            .node_indices()
            .filter_map(|idx| self.graph[idx].owner.as_ref())
            .collect();
        set.into_iter().cloned().collect()
    }

    /// Every edge as `(source, target, kind)`.
    pub fn edges(&self) -> impl Iterator<Item = (&Path, &Path, Edge)> + '_ {
        self.graph.edge_references().map(move |e| {
            (&self.graph[e.source()].path, &self.graph[e.target()].path, *e.weight())
        })
    }

    /// Immediate predecessors of `path`, sorted, with the kind of each link.
    pub fn predecessors(&self, path: &Path) -> Vec<(&Path, Edge)> {
        let Some(&idx) = self.index.get(path) else { return Vec::new() };
        let mut preds: Vec<(&Path, Edge)> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| (&self.graph[e.source()].path, *e.weight()))
            .collect();
        preds.sort();
        preds
    }

    // --- Graph Algorithms ---

    /// Everything `paths` (transitively) depend on, themselves included.
    pub fn upstream_from(&self, paths: &[Path]) -> BTreeSet<Path> {
        self.reachable(paths, Direction::Incoming)
    }

    /// Everything that (transitively) depends on `paths`, themselves included.
    /// Used for incremental invalidation.
    pub fn downstream_from(&self, paths: &[Path]) -> BTreeSet<Path> {
        self.reachable(paths, Direction::Outgoing)
    }

    /// Functions that must re-run when `path` changes, by declaration index.
    pub fn dependents_of(&self, path: &Path) -> Vec<FuncRef> {
        let set: BTreeSet<&FuncRef> = self
            .downstream_from(std::slice::from_ref(path))
            .iter()
            .filter(|p| *p != path)
            .filter_map(|p| self.owner(p))
            .collect();
        set.into_iter().cloned().collect()
    }

    fn reachable(&self, paths: &[Path], dir: Direction) -> BTreeSet<Path> {
        let mut visited = HashSet::new();
        let mut queue: VecDeque<NodeIndex> =
            paths.iter().filter_map(|p| self.index_of(p)).collect();

        while let Some(node) = queue.pop_front() {
            if visited.insert(node) {
                queue.extend(self.graph.neighbors_directed(node, dir));
            }
        }
        visited.into_iter().map(|idx| self.graph[idx].path.clone()).collect()
    }
}
