use crate::graph::{DependencyGraph, Edge};
use crate::store::Path;
use std::collections::HashMap;
use std::fmt::Write;

/// One `source target` pair per line, sorted, each line newline-terminated.
pub fn format_edgelist(graph: &DependencyGraph) -> String {
    let mut lines: Vec<String> = graph.edges().map(|(s, t, _)| format!("{} {}\n", s, t)).collect();
    lines.sort();
    lines.concat()
}

/// Renders the upstream dependency tree of `target`: what it is computed
/// from, down to the inputs.
pub fn format_trace(graph: &DependencyGraph, target: &Path) -> String {
    let mut tracer = Tracer {
        graph,
        visited_at_level: HashMap::new(),
        output: String::new(),
    };

    if graph.contains(target) {
        let _ = writeln!(tracer.output, "DEPENDENCY TRACE for '{}':", target);
        let _ = writeln!(tracer.output, "--------------------------------------------------");
        tracer.trace_node(target, None, 1, "");
    } else {
        let _ = writeln!(tracer.output, "Error: Unknown path '{}'", target);
    }
    tracer.output
}

struct Tracer<'a> {
    graph: &'a DependencyGraph,
    visited_at_level: HashMap<&'a Path, usize>,
    output: String,
}

impl<'a> Tracer<'a> {
    fn trace_node(&mut self, path: &'a Path, link: Option<Edge>, level: usize, prefix: &str) {
        if let Some(&first_seen) = self.visited_at_level.get(path) {
            let _ = writeln!(self.output, "{}-> (Ref to L{})", prefix, first_seen);
            return;
        }
        self.visited_at_level.insert(path, level);

        let origin = match self.graph.owner(path) {
            Some(func) => format!("<- {}", func),
            None => "[input]".to_string(),
        };
        let marker = if link == Some(Edge::Ancestry) { " (container)" } else { "" };
        let _ = writeln!(self.output, "{}[L{}] {} {}{}", prefix, level, path, origin, marker);

        let parents = self.graph.predecessors(path);
        let stem = self.build_child_stem(prefix);
        for (i, &(parent, kind)) in parents.iter().enumerate() {
            let connector = if i == parents.len() - 1 { "`-- " } else { "|-- " };
            let full_prefix = format!("{}{}", stem, connector);
            self.trace_node(parent, Some(kind), level + 1, &full_prefix);
        }
    }

    fn build_child_stem(&self, current_prefix: &str) -> String {
        current_prefix.replace("`-- ", "    ").replace("|-- ", "|   ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use crate::store::{DependencyRecord, FuncRef};

    fn rec(target: &str, sources: &[&str], index: usize) -> DependencyRecord {
        DependencyRecord::new(
            Some(Path::from(target)),
            sources.iter().map(|s| Path::from(*s)).collect(),
            FuncRef::new(index, format!("f{}", index)),
        )
    }

    #[test]
    fn test_edgelist_is_sorted_and_terminated() {
        let g = build_graph(&[rec("R.b", &["R.a"], 0)]);
        assert_eq!(format_edgelist(&g), "R R.a\nR R.b\nR.a R.b\n");
    }

    #[test]
    fn test_edgelist_of_empty_graph() {
        assert_eq!(format_edgelist(&DependencyGraph::default()), "");
    }

    #[test]
    fn test_trace_structure() {
        let g = build_graph(&[rec("R.c", &["R.a", "R.b"], 0), rec("R.b", &["R.a"], 1)]);
        let trace = format_trace(&g, &Path::from("R.c"));
        let expected = "\
DEPENDENCY TRACE for 'R.c':
--------------------------------------------------
[L1] R.c <- f0#0
|-- [L2] R [input] (container)
|-- [L2] R.a [input]
|   `-- -> (Ref to L2)
`-- [L2] R.b <- f1#1
    |-- -> (Ref to L2)
    `-- -> (Ref to L2)
";
        assert_eq!(trace, expected);
    }

    #[test]
    fn test_trace_unknown_path() {
        let g = build_graph(&[rec("R.b", &["R.a"], 0)]);
        assert!(format_trace(&g, &Path::from("R.zz")).starts_with("Error: Unknown path 'R.zz'"));
    }
}
