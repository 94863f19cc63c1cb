//! Board configuration loaded with figment
//!
//! Sources are merged in precedence order (later sources override earlier ones):
//! 1. Default values
//! 2. `.taskboard/config.toml`, `.taskboard/config.yaml`, `.taskboard/config.json`
//! 3. Environment variables with the `TASKBOARD_` prefix

use crate::error::{BoardError, Result};
use crate::ordering::DEFAULT_GAP;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix for environment overrides, e.g. `TASKBOARD_GAP=500`
pub const ENV_PREFIX: &str = "TASKBOARD_";

/// Directory holding board data and config, relative to the project root
pub const DEFAULT_DATA_DIR: &str = ".taskboard";

/// Tunables for the ordering engine and store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Key distance at lane boundaries and after a rebalance
    pub gap: i64,
    /// Capacity of the store's event channel
    pub event_capacity: usize,
    /// Reload canonical state when a write confirms after a resync raced it
    pub resync_on_confirm: bool,
    /// Board data directory; relative paths resolve against the project root
    pub data_dir: PathBuf,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            gap: DEFAULT_GAP,
            event_capacity: 64,
            resync_on_confirm: true,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl BoardConfig {
    /// Load and validate configuration for the project at `project_dir`
    pub fn load(project_dir: impl AsRef<Path>) -> Result<Self> {
        let config: Self = Self::figment(project_dir.as_ref()).extract()?;
        debug!(?config, "loaded board configuration");
        config.validate()
    }

    /// Build the figment with all sources in precedence order
    pub fn figment(project_dir: &Path) -> Figment {
        let config_dir = project_dir.join(DEFAULT_DATA_DIR);
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(config_dir.join("config.toml")))
            .merge(Yaml::file(config_dir.join("config.yaml")))
            .merge(Json::file(config_dir.join("config.json")))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Reject values the engine cannot work with
    pub fn validate(self) -> Result<Self> {
        if self.gap <= 0 {
            return Err(BoardError::config("gap", "must be positive"));
        }
        if self.event_capacity == 0 {
            return Err(BoardError::config("event_capacity", "must be at least 1"));
        }
        Ok(self)
    }

    /// Absolute data directory for the project at `project_dir`
    pub fn data_path(&self, project_dir: impl AsRef<Path>) -> PathBuf {
        if self.data_dir.is_absolute() {
            self.data_dir.clone()
        } else {
            project_dir.as_ref().join(&self.data_dir)
        }
    }

    /// Set the gap
    pub fn with_gap(mut self, gap: i64) -> Self {
        self.gap = gap;
        self
    }
}
