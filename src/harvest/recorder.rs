//! The recording state shared by the placeholders of one harvest.
//!
//! Reads form an access tree rooted at the synthetic root symbol; the leaves
//! of that tree are the maximal read paths. Writes are kept as a flat list in
//! the order they happen.

use crate::store::Path;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug)]
struct AccessNode {
    path: Path,
    children: Vec<usize>,
    touched: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Unsupported {
    pub operation: String,
    pub partial_path: Option<Path>,
}

/// What one function did to its placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Recording {
    pub reads: Vec<Path>,
    pub writes: Vec<Path>,
}

#[derive(Debug)]
struct RecorderState {
    root: Path,
    params: Vec<Path>,
    nodes: Vec<AccessNode>,
    index: HashMap<Path, usize>,
    tops: Vec<usize>,
    writes: Vec<Path>,
    failure: Option<Unsupported>,
}

impl RecorderState {
    fn seeded(root: Path, params: Vec<Path>) -> Self {
        let mut state = Self {
            root,
            params: Vec::new(),
            nodes: Vec::new(),
            index: HashMap::new(),
            tops: Vec::new(),
            writes: Vec::new(),
            failure: None,
        };
        let root = state.root.clone();
        state.ensure(&root);
        // Parameters are pre-seeded so discovery order follows declaration order.
        for p in &params {
            state.ensure(p);
        }
        state.params = params;
        state
    }

    fn ensure(&mut self, path: &Path) -> usize {
        if let Some(&idx) = self.index.get(path) {
            return idx;
        }
        let parent = path.parent().map(|p| self.ensure(&p));
        let idx = self.nodes.len();
        self.nodes.push(AccessNode { path: path.clone(), children: Vec::new(), touched: false });
        self.index.insert(path.clone(), idx);
        match parent {
            Some(p) => self.nodes[p].children.push(idx),
            None => self.tops.push(idx),
        }
        idx
    }

    /// Post-order walk; returns whether the subtree holds any touched node.
    fn collect_leaves(&self, idx: usize, out: &mut Vec<Path>) -> bool {
        let node = &self.nodes[idx];
        let mut below = false;
        for &child in &node.children {
            below |= self.collect_leaves(child, out);
        }
        if node.touched && !below {
            out.push(node.path.clone());
        }
        below || node.touched
    }
}

/// Cheaply clonable handle; every placeholder of one harvest holds one.
#[derive(Debug, Clone)]
pub(crate) struct Recorder(Rc<RefCell<RecorderState>>);

impl Recorder {
    pub fn new(root: Path, params: Vec<Path>) -> Self {
        Self(Rc::new(RefCell::new(RecorderState::seeded(root, params))))
    }

    /// Drops everything recorded so far, keeping only the seeded parameters.
    pub fn reset(&self) {
        let mut state = self.0.borrow_mut();
        let root = state.root.clone();
        let params = std::mem::take(&mut state.params);
        *state = RecorderState::seeded(root, params);
    }

    pub fn read(&self, path: &Path) {
        let mut state = self.0.borrow_mut();
        let idx = state.ensure(path);
        state.nodes[idx].touched = true;
    }

    pub fn write(&self, path: Path) {
        let mut state = self.0.borrow_mut();
        if !state.writes.contains(&path) {
            state.writes.push(path);
        }
    }

    /// Keeps the first failure only.
    pub fn fail(&self, operation: impl Into<String>, partial_path: Option<Path>) {
        let mut state = self.0.borrow_mut();
        if state.failure.is_none() {
            state.failure = Some(Unsupported { operation: operation.into(), partial_path });
        }
    }

    pub fn finish(&self) -> Result<Recording, Unsupported> {
        let state = self.0.borrow();
        if let Some(failure) = &state.failure {
            return Err(failure.clone());
        }
        let mut reads = Vec::new();
        for &top in &state.tops {
            state.collect_leaves(top, &mut reads);
        }
        Ok(Recording { reads, writes: state.writes.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(params: &[&str]) -> Recorder {
        let root = Path::from("R");
        Recorder::new(root.clone(), params.iter().map(|p| root.child(p)).collect())
    }

    #[test]
    fn test_intermediate_reads_are_absorbed() {
        let rec = recorder(&["df"]);
        rec.read(&Path::from("R.df.hh"));
        rec.read(&Path::from("R.df.hh.tt"));
        rec.read(&Path::from("R.df.hh.tt.ss"));
        assert_eq!(rec.finish().unwrap().reads, vec![Path::from("R.df.hh.tt.ss")]);
    }

    #[test]
    fn test_untouched_params_are_silent() {
        let rec = recorder(&["df", "params"]);
        assert_eq!(rec.finish().unwrap(), Recording::default());
    }

    #[test]
    fn test_leaves_follow_param_order() {
        let rec = recorder(&["df", "params"]);
        rec.read(&Path::from("R.params.b"));
        rec.read(&Path::from("R.df"));
        let reads = rec.finish().unwrap().reads;
        assert_eq!(reads, vec![Path::from("R.df"), Path::from("R.params.b")]);
    }

    #[test]
    fn test_reset_clears_reads_writes_and_failures() {
        let rec = recorder(&["df"]);
        rec.read(&Path::from("R.df.a"));
        rec.write(Path::from("R.df.b"));
        rec.fail("item assignment", None);
        rec.reset();
        rec.read(&Path::from("R.df.c"));
        let recording = rec.finish().unwrap();
        assert_eq!(recording.reads, vec![Path::from("R.df.c")]);
        assert!(recording.writes.is_empty());
    }

    #[test]
    fn test_first_failure_wins() {
        let rec = recorder(&["df"]);
        rec.fail("first", Some(Path::from("R.df")));
        rec.fail("second", None);
        assert_eq!(rec.finish().unwrap_err().operation, "first");
    }
}
