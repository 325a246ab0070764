//! Engine options. Discovering and reading config files is left to the host;
//! this module only parses and validates what it is handed.

use crate::analysis::topology::TieBreak;
use crate::store::path::{is_valid_component, Path, DEFAULT_ROOT};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Malformed engine config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid root symbol '{0}': must be one non-empty path component")]
    InvalidRoot(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Synthetic symbol every harvested path is rooted at.
    pub root_symbol: String,
    /// How the scheduler orders functions that are ready at the same time.
    pub tie_break: TieBreak,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { root_symbol: DEFAULT_ROOT.to_string(), tie_break: TieBreak::default() }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON document. Missing fields take defaults.
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_component(&self.root_symbol) {
            return Err(ConfigError::InvalidRoot(self.root_symbol.clone()));
        }
        Ok(())
    }

    pub fn root(&self) -> Path {
        Path::new(self.root_symbol.clone())
    }
}
