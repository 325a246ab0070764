//! Defines the path-level dependency graph.
pub mod dag;
pub mod edge;
pub mod node;

// Re-export key types for convenient access
pub use dag::{build_graph, DependencyGraph};
pub use edge::Edge;
pub use node::{PathNode, TargetConflict};
