//! Path canonicalization and scheduling over the dependency graph.
pub mod prefixes;
pub mod topology;

pub use prefixes::{filter_common_prefixes, gen_all_prefix_pairs};
pub use topology::{schedule, schedule_with, CycleError, TieBreak};
