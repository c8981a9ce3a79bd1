//! Versioning configuration.
//!
//! Sources, highest priority first:
//! 1. Environment variables (`GRAPHLOG_` prefix, `__` as separator),
//!    e.g. `GRAPHLOG_VERSIONING__LIMIT=25`
//! 2. The `[versioning]` table of an optional TOML file
//! 3. Built-in defaults

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

pub const DEFAULT_LIMIT: usize = 10;

const fn default_enabled() -> bool {
    true
}

const fn default_limit() -> usize {
    DEFAULT_LIMIT
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VersioningConfig {
    /// Record actions for store mutations.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Maximum rows returned by a history query.
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Persist each rollback as a new action that can itself be rolled back.
    #[serde(default)]
    pub record_rollbacks: bool,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            limit: default_limit(),
            record_rollbacks: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
struct ConfigFile {
    #[serde(default)]
    versioning: VersioningConfig,
}

impl VersioningConfig {
    /// Build the provider chain. `path` need not exist.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(ConfigFile::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed("GRAPHLOG_").split("__"))
    }

    pub fn load(path: Option<&Path>) -> Result<Self, EngineError> {
        let file: ConfigFile = Self::figment(path).extract()?;
        file.versioning.validate()?;
        Ok(file.versioning)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.limit < 1 {
            return Err(EngineError::InvalidLimit(self.limit));
        }
        Ok(())
    }
}
