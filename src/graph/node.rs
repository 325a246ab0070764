//! Defines the node weight of the dependency graph.

use crate::store::{FuncRef, Path};

/// A path in the dependency graph.
///
/// `owner` is set when some calculation function writes this path. Nodes
/// without an owner are externally supplied inputs or synthesized containers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathNode {
    pub path: Path,
    pub owner: Option<FuncRef>,
}

impl PathNode {
    pub fn new(path: Path) -> Self {
        Self { path, owner: None }
    }

    pub fn is_input(&self) -> bool {
        self.owner.is_none()
    }
}

/// Two functions claimed the same target; the later one was kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConflict {
    pub target: Path,
    pub overridden: FuncRef,
    pub winner: FuncRef,
}
