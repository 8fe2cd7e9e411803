use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::logging::LogLevel;

/// Largest payload a store accepts by default: 500 MiB.
pub const DEFAULT_MAX_SHARD_SIZE: u64 = 500 * 1024 * 1024;

/// Configuration for a shard store.
///
/// Loadable from TOML:
///
/// ```toml
/// root = "/var/lib/shards"
/// log_level = "warn"          # optional, default "info"
/// max_shard_size = 1048576    # optional, default 500 MiB
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory owning every shard of one store instance.
    pub root: PathBuf,
    #[serde(default)]
    pub log_level: LogLevel,
    #[serde(default = "default_max_shard_size")]
    pub max_shard_size: u64,
}

fn default_max_shard_size() -> u64 {
    DEFAULT_MAX_SHARD_SIZE
}

impl StoreConfig {
    /// Configuration for `root` with default level and size limit.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            log_level: LogLevel::default(),
            max_shard_size: DEFAULT_MAX_SHARD_SIZE,
        }
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    pub fn with_max_shard_size(mut self, limit: u64) -> Self {
        self.max_shard_size = limit;
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Reject configurations no store can be built from.
    pub fn validate(&self) -> StoreResult<()> {
        if self.root.as_os_str().is_empty() {
            return Err(StoreError::Config("storage root path is required".into()));
        }
        if self.max_shard_size == 0 {
            return Err(StoreError::Config("max_shard_size must be positive".into()));
        }
        Ok(())
    }
}
