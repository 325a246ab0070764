//! The pipeline-level error, wrapping each stage's own error type.

use crate::analysis::topology::CycleError;
use crate::config::ConfigError;
use crate::harvest::HarvestError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Harvest(#[from] HarvestError),
    #[error(transparent)]
    Cycle(#[from] CycleError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
