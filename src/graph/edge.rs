//! Defines the `Edge` type, representing a dependency between two path nodes.
use serde::{Deserialize, Serialize};

/// Describes why one path node precedes another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Edge {
    /// A function reads the source path to produce the target path.
    /// Example: `df.rps = df.rpm / 60` gives `R.df.rpm -> R.df.rps`.
    Data,
    /// The source is the immediate container of the target.
    /// Example: `R.df -> R.df.rps`, so reading `R.df.rps.x` waits for
    /// whoever writes `R.df.rps`.
    Ancestry,
}
