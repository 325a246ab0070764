//! Plain-data types shared by every stage: paths, function handles and records.
pub mod path;
pub mod types;

pub use path::{is_valid_component, Path, DEFAULT_ROOT};
pub use types::{DependencyRecord, FuncRef};
