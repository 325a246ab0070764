use super::path::Path;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to a calculation function.
///
/// `index` is the function's position in the tuple returned by its factory,
/// so the host can map a handle back to the real function at evaluation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FuncRef {
    pub index: usize,
    pub name: String,
}

impl FuncRef {
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self { index, name: name.into() }
    }
}

impl fmt::Display for FuncRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.index)
    }
}

/// The (target, sources, function) tuple harvested from one calculation function.
///
/// `target` is `None` for pure-read probe functions. `sources` are
/// canonicalized and sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub target: Option<Path>,
    pub sources: Vec<Path>,
    pub func: FuncRef,
}

impl DependencyRecord {
    pub fn new(target: Option<Path>, sources: Vec<Path>, func: FuncRef) -> Self {
        Self { target, sources, func }
    }

    pub fn is_probe(&self) -> bool {
        self.target.is_none()
    }
}

impl fmt::Display for DependencyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = self.target.as_ref().map_or("<probe>", |t| t.as_str());
        let sources: Vec<&str> = self.sources.iter().map(Path::as_str).collect();
        write!(f, "{} <- [{}] ({})", target, sources.join(", "), self.func)
    }
}
