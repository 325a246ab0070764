//! Human-readable renderings of a dependency graph.
pub mod trace;

pub use trace::{format_edgelist, format_trace};
