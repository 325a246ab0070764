use crate::graph::DependencyGraph;
use crate::store::{FuncRef, Path};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BinaryHeap, HashMap, VecDeque};
use thiserror::Error;
use tracing::debug;

/// How functions that become ready at the same time are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Factory declaration order, so the output stays close to how the
    /// functions were written.
    #[default]
    Declaration,
    /// Target path order.
    Lexicographic,
}

/// The graph's function-bearing nodes cannot be linearized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Cycle detected: {}", render_cycle(.cycle))]
pub struct CycleError {
    /// Shortest cyclic chain, without repeating the first path at the end.
    pub cycle: Vec<Path>,
    /// Functions owning a path on the cycle, by declaration index.
    pub functions: Vec<FuncRef>,
}

fn render_cycle(cycle: &[Path]) -> String {
    let mut parts: Vec<&str> = cycle.iter().map(Path::as_str).collect();
    if let Some(first) = parts.first().copied() {
        parts.push(first);
    }
    parts.join(" -> ")
}

/// Priority of a ready unit; the smallest is taken first. Input and container
/// nodes go before any function.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct Ready<'g> {
    owned: bool,
    rank: usize,
    path: &'g Path,
    unit: usize,
}

/// Scheduling units: one per function that writes a path, one per path no
/// function writes. Every link remembers the path that requires it.
struct Units<'g> {
    owner: Vec<Option<&'g FuncRef>>,
    label: Vec<&'g Path>,
    succ: Vec<BTreeMap<usize, &'g Path>>,
    in_degree: Vec<usize>,
}

impl<'g> Units<'g> {
    fn build(graph: &'g DependencyGraph) -> Self {
        let g = &graph.graph;
        let mut units = Units {
            owner: Vec::new(),
            label: Vec::new(),
            succ: Vec::new(),
            in_degree: Vec::new(),
        };

        // 1. One unit per writing function; writers of each path in declaration order
        let mut by_func: HashMap<&'g FuncRef, usize> = HashMap::new();
        let mut writers: BTreeMap<&'g Path, Vec<&'g FuncRef>> = BTreeMap::new();
        for record in graph.records() {
            let Some(target) = &record.target else { continue };
            let func = &record.func;
            let unit = *by_func.entry(func).or_insert_with(|| units.push(Some(func), target));
            if target < units.label[unit] {
                units.label[unit] = target;
            }
            let chain = writers.entry(target).or_default();
            if chain.last() != Some(&func) {
                chain.push(func);
            }
        }

        // 2. Every node is produced by its owner's unit, or by a unit of its own
        let mut node_unit = vec![0usize; g.node_count()];
        for node in g.node_indices() {
            let owned = g[node].owner.as_ref().and_then(|f| by_func.get(f).copied());
            node_unit[node.index()] = match owned {
                Some(unit) => unit,
                None => units.push(None, &g[node].path),
            };
        }
        let producer = |path: &Path| graph.index_of(path).map(|n| node_unit[n.index()]);

        // 3. Unwritten nodes wait for their container
        for node in g.node_indices() {
            if g[node].owner.is_some() {
                continue;
            }
            for parent in g.neighbors_directed(node, Direction::Incoming) {
                units.link(node_unit[parent.index()], node_unit[node.index()], &g[node].path);
            }
        }

        // 4. A function waits for its targets' containers and for its sources.
        //    Reading its own target means reading the previous writer's value.
        for record in graph.records() {
            let Some(target) = &record.target else { continue };
            let to = by_func[&record.func];
            let container = target.parent();
            for source in container.iter().chain(&record.sources).filter(|s| *s != target) {
                if let Some(from) = producer(source) {
                    units.link(from, to, target);
                }
            }
        }

        // 5. Overridden writers run before the writer that keeps the path
        for (target, chain) in &writers {
            for pair in chain.windows(2) {
                units.link(by_func[pair[0]], by_func[pair[1]], *target);
            }
        }

        units
    }

    fn push(&mut self, owner: Option<&'g FuncRef>, label: &'g Path) -> usize {
        self.owner.push(owner);
        self.label.push(label);
        self.succ.push(BTreeMap::new());
        self.in_degree.push(0);
        self.owner.len() - 1
    }

    fn link(&mut self, from: usize, to: usize, via: &'g Path) {
        if from == to {
            return;
        }
        match self.succ[from].entry(to) {
            Entry::Vacant(e) => {
                e.insert(via);
                self.in_degree[to] += 1;
            }
            Entry::Occupied(mut e) => {
                if via < *e.get() {
                    e.insert(via);
                }
            }
        }
    }

    fn len(&self) -> usize {
        self.owner.len()
    }
}

/// Orders the graph's functions by declaration order where dependencies allow.
pub fn schedule(graph: &DependencyGraph) -> Result<Vec<FuncRef>, CycleError> {
    schedule_with(graph, TieBreak::Declaration)
}

/// Kahn's algorithm with a priority ready-queue over scheduling units.
///
/// A function is emitted once, after everything any of its targets needs.
/// When several functions write the same path they run in declaration order,
/// so the last one's value is the one readers see. Probe functions write
/// nothing and are not scheduled.
pub fn schedule_with(
    graph: &DependencyGraph,
    tie_break: TieBreak,
) -> Result<Vec<FuncRef>, CycleError> {
    let units = Units::build(graph);

    let ready = |unit: usize| {
        let owner = units.owner[unit];
        let rank = match (owner, tie_break) {
            (Some(f), TieBreak::Declaration) => f.index,
            _ => 0,
        };
        Reverse(Ready { owned: owner.is_some(), rank, path: units.label[unit], unit })
    };

    let mut in_degree = units.in_degree.clone();
    let mut heap: BinaryHeap<_> =
        (0..units.len()).filter(|&u| in_degree[u] == 0).map(ready).collect();

    let mut processed = 0;
    let mut order = Vec::new();

    while let Some(Reverse(Ready { unit, .. })) = heap.pop() {
        processed += 1;
        if let Some(f) = units.owner[unit] {
            order.push(f.clone());
        }
        for &next in units.succ[unit].keys() {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                heap.push(ready(next));
            }
        }
    }

    if processed != units.len() {
        let stuck: Vec<bool> = in_degree.iter().map(|&d| d > 0).collect();
        return Err(cycle_error(&units, &stuck));
    }

    debug!(
        "Scheduled {} function(s) over {} node(s); {} probe(s) left unscheduled",
        order.len(),
        graph.node_count(),
        graph.probes().len()
    );
    Ok(order)
}

/// Finds the shortest cycle among the units Kahn's algorithm could not
/// release, ties going to the smallest starting path. Each unit on the cycle
/// is named by the path its incoming link was made for.
fn cycle_error(units: &Units<'_>, stuck: &[bool]) -> CycleError {
    let successors = |unit: usize| {
        let mut next: Vec<usize> =
            units.succ[unit].keys().copied().filter(|&u| stuck[u]).collect();
        next.sort_by_key(|&u| units.label[u]);
        next
    };

    let mut starts: Vec<usize> = (0..units.len()).filter(|&u| stuck[u]).collect();
    starts.sort_by_key(|&u| units.label[u]);

    let mut best: Option<Vec<usize>> = None;
    for &start in &starts {
        let mut prev: BTreeMap<usize, usize> = BTreeMap::new();
        let mut queue = VecDeque::from([start]);
        let mut closing = None;

        'bfs: while let Some(unit) = queue.pop_front() {
            for n in successors(unit) {
                if n == start {
                    closing = Some(unit);
                    break 'bfs;
                }
                if let Entry::Vacant(e) = prev.entry(n) {
                    e.insert(unit);
                    queue.push_back(n);
                }
            }
        }

        if let Some(last) = closing {
            let mut cycle = vec![last];
            let mut cur = last;
            while cur != start {
                match prev.get(&cur) {
                    Some(&p) => {
                        cycle.push(p);
                        cur = p;
                    }
                    None => break,
                }
            }
            cycle.reverse();
            if best.as_ref().map_or(true, |b| cycle.len() < b.len()) {
                best = Some(cycle);
            }
        }
    }

    // Kahn leftovers always hold a cycle; fall back to all of them otherwise.
    let members = best.unwrap_or(starts);
    let n = members.len();
    let cycle: Vec<Path> = (0..n)
        .map(|i| {
            let (from, to) = (members[(i + n - 1) % n], members[i]);
            units.succ[from].get(&to).copied().unwrap_or(units.label[to]).clone()
        })
        .collect();
    let mut functions: Vec<FuncRef> =
        members.iter().filter_map(|&u| units.owner[u].cloned()).collect();
    functions.sort();
    functions.dedup();

    CycleError { cycle, functions }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use crate::store::DependencyRecord;

    fn rec(target: &str, sources: &[&str], index: usize) -> DependencyRecord {
        DependencyRecord::new(
            Some(Path::from(target)),
            sources.iter().map(|s| Path::from(*s)).collect(),
            FuncRef::new(index, format!("f{}", index)),
        )
    }

    fn names(order: &[FuncRef]) -> Vec<&str> {
        order.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_sort_diamond_dependency() {
        // Shape: a -> b, a -> c, b+c -> d, declared in reverse.
        let g = build_graph(&[
            rec("R.d", &["R.b", "R.c"], 0),
            rec("R.c", &["R.a"], 1),
            rec("R.b", &["R.a"], 2),
            rec("R.a", &["R.in"], 3),
        ]);
        let order = schedule(&g).expect("Sort failed");
        assert_eq!(names(&order), vec!["f3", "f1", "f2", "f0"]);
    }

    #[test]
    fn test_independent_functions_keep_declaration_order() {
        let g = build_graph(&[
            rec("R.z", &["R.in1"], 0),
            rec("R.y", &["R.in2"], 1),
            rec("R.x", &["R.in3"], 2),
        ]);
        assert_eq!(names(&schedule(&g).unwrap()), vec!["f0", "f1", "f2"]);
        assert_eq!(
            names(&schedule_with(&g, TieBreak::Lexicographic).unwrap()),
            vec!["f2", "f1", "f0"]
        );
    }

    #[test]
    fn test_nested_read_waits_for_container_writer() {
        // f0 reads a member of what f1 writes.
        let g = build_graph(&[
            rec("R.out", &["R.df.hh.tt.ss"], 0),
            rec("R.df.hh.tt", &["R.in"], 1),
        ]);
        assert_eq!(names(&schedule(&g).unwrap()), vec!["f1", "f0"]);
    }

    #[test]
    fn test_multi_target_function_emitted_once() {
        let g = build_graph(&[
            rec("R.df.hh.tt", &["R.params.tt"], 0),
            rec("R.df.hh.ll", &["R.params.tt"], 0),
            rec("R.out", &["R.df.hh.ll"], 1),
        ]);
        assert_eq!(names(&schedule(&g).unwrap()), vec!["f0", "f1"]);
    }

    #[test]
    fn test_dependent_of_first_target_waits_for_whole_function() {
        // f5 writes R.a and R.b.x; R.b.x waits for f6, which writes its container.
        let g = build_graph(&[
            rec("R.out", &["R.a"], 1),
            rec("R.late", &["R.in"], 3),
            rec("R.a", &["R.in"], 5),
            rec("R.b.x", &["R.in"], 5),
            rec("R.b", &["R.late"], 6),
        ]);
        let order = schedule(&g).unwrap();
        let pos = |name: &str| order.iter().position(|f| f.name == name).unwrap();
        assert!(pos("f5") < pos("f1"));
        assert_eq!(order.iter().filter(|f| f.name == "f5").count(), 1);
    }

    #[test]
    fn test_cycle_through_sibling_targets() {
        // f0 writes R.a.x and R.b; f1 turns R.b into R.a, the container of R.a.x.
        let g = build_graph(&[
            rec("R.a.x", &["R.in"], 0),
            rec("R.b", &["R.in"], 0),
            rec("R.a", &["R.b"], 1),
        ]);
        let err = schedule(&g).unwrap_err();
        assert_eq!(err.cycle, vec!["R.a", "R.a.x"]);
        assert_eq!(names(&err.functions), vec!["f0", "f1"]);
    }

    #[test]
    fn test_cycle_detection_explicit() {
        let g = build_graph(&[
            rec("R.a", &["R.c"], 0),
            rec("R.b", &["R.a"], 1),
            rec("R.c", &["R.b"], 2),
            rec("R.d", &["R.c"], 3),
        ]);
        let err = schedule(&g).unwrap_err();
        assert_eq!(err.cycle, vec!["R.a", "R.b", "R.c"]);
        assert_eq!(names(&err.functions), vec!["f0", "f1", "f2"]);
        assert!(err.to_string().contains("R.a -> R.b -> R.c -> R.a"), "Msg: {}", err);
    }

    #[test]
    fn test_cycle_reports_the_shortest_loop() {
        // A 2-cycle (x <-> y) next to a 3-cycle (a -> b -> c -> a).
        let g = build_graph(&[
            rec("R.a", &["R.c"], 0),
            rec("R.b", &["R.a"], 1),
            rec("R.c", &["R.b"], 2),
            rec("R.x", &["R.y"], 3),
            rec("R.y", &["R.x"], 4),
        ]);
        let err = schedule(&g).unwrap_err();
        assert_eq!(err.cycle, vec!["R.x", "R.y"]);
    }

    #[test]
    fn test_in_place_update_of_input_is_not_a_cycle() {
        let g = build_graph(&[rec("R.a", &["R.a"], 0)]);
        assert_eq!(names(&schedule(&g).unwrap()), vec!["f0"]);
    }

    #[test]
    fn test_in_place_update_runs_after_previous_writer() {
        let g = build_graph(&[
            rec("R.df.x", &["R.df.a"], 0),
            rec("R.df.x", &["R.df.x"], 1),
            rec("R.out", &["R.df.x"], 2),
        ]);
        assert_eq!(names(&schedule(&g).unwrap()), vec!["f0", "f1", "f2"]);
        assert_eq!(
            names(&schedule_with(&g, TieBreak::Lexicographic).unwrap()),
            vec!["f0", "f1", "f2"]
        );
    }

    #[test]
    fn test_overridden_writer_runs_before_winner() {
        // f0 loses R.x to f1 but still writes R.y, which waits for f3.
        let g = build_graph(&[
            rec("R.x", &["R.in"], 0),
            rec("R.y", &["R.late"], 0),
            rec("R.x", &["R.in"], 1),
            rec("R.z", &["R.x"], 2),
            rec("R.late", &["R.in"], 3),
        ]);
        assert_eq!(g.owner(&Path::from("R.x")), Some(&FuncRef::new(1, "f1")));
        assert_eq!(names(&schedule(&g).unwrap()), vec!["f3", "f0", "f1", "f2"]);
    }

    #[test]
    fn test_overridden_writer_that_cannot_run_first_is_a_cycle() {
        // f0 must precede f1, yet writes into R.c, which f2 builds from f1's R.x.
        let g = build_graph(&[
            rec("R.x", &["R.in"], 0),
            rec("R.c.y", &["R.in"], 0),
            rec("R.x", &["R.in"], 1),
            rec("R.c", &["R.x"], 2),
        ]);
        let err = schedule(&g).unwrap_err();
        assert_eq!(err.cycle, vec!["R.c", "R.c.y", "R.x"]);
        assert_eq!(names(&err.functions), vec!["f0", "f1", "f2"]);
    }

    #[test]
    fn test_empty_graph() {
        assert!(schedule(&DependencyGraph::default()).unwrap().is_empty());
    }
}
