//! Dependency discovery and scheduling for single-assignment calculations.
//!
//! Calculation functions are run against path-recording placeholders
//! ([`harvest::Value`]) to learn which data paths each one reads and writes.
//! The resulting [`DependencyRecord`]s form a path-level graph which is then
//! linearized into an execution order, or rejected with a [`CycleError`].

pub mod analysis;
pub mod config;
pub mod display;
pub mod error;
pub mod graph;
pub mod harvest;
pub mod planner;
pub mod store;

pub use analysis::{
    filter_common_prefixes, gen_all_prefix_pairs, schedule, schedule_with, CycleError, TieBreak,
};
pub use config::{ConfigError, EngineConfig};
pub use display::{format_edgelist, format_trace};
pub use error::{Error, Result};
pub use graph::{build_graph, DependencyGraph, Edge};
pub use harvest::{
    harvest_func, harvest_funcs_factory, Access, AccessMode, Calculation, Factory, Function,
    HarvestError, Key, Value,
};
pub use planner::{plan, ExecutionPlan};
pub use store::{DependencyRecord, FuncRef, Path};
