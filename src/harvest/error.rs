//! Defines the error types for the harvest module.
use crate::store::Path;
use thiserror::Error;

/// Failure type carried out of user-supplied factories and calculation bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum HarvestError {
    /// The factory itself failed while building its functions.
    #[error("Factory '{factory}' failed: {source}")]
    FactoryFailed { factory: String, source: BoxError },

    /// A calculation body failed for reasons unrelated to the placeholders.
    /// The caller decides whether to skip the function or abort.
    #[error("Function '{function}' failed during harvest: {source}")]
    FunctionFailed { function: String, source: BoxError },

    /// An access the placeholders cannot attribute to a path.
    #[error(
        "Unsupported access in '{function}': {operation} (partial path: {})",
        .partial_path.as_ref().map_or("<none>", |p| p.as_str())
    )]
    UnsupportedAccess {
        function: String,
        operation: String,
        partial_path: Option<Path>,
    },
}

impl HarvestError {
    /// Name of the function (or factory) that failed.
    pub fn function(&self) -> &str {
        match self {
            HarvestError::FactoryFailed { factory, .. } => factory,
            HarvestError::FunctionFailed { function, .. } => function,
            HarvestError::UnsupportedAccess { function, .. } => function,
        }
    }
}
