//! Run configuration
//!
//! `RunConfig` is built in code. It derives serde, and the TOML helpers let
//! a caller keep a run section in its own config file:
//!
//! ```toml
//! mode = "copy_then_modify"   # or "in_place"
//! flush_every = 10000
//! # epoch = 1717171717        # default: wall clock seconds at begin
//!
//! [store]
//! map_size = 107374182400
//! max_readers = 126
//! ```

use checkpoint_storage::StoreConfig;
use serde::{Deserialize, Serialize};

use crate::error::{DiffError, DiffResult};

/// Puts queued between flushes by default.
pub const DEFAULT_FLUSH_EVERY: usize = 10_000;

/// How a run treats the live checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Mutate a sibling working copy and swap it in on success.
    ///
    /// A failed run leaves the previous checkpoint untouched.
    #[default]
    CopyThenModify,
    /// Mutate the live checkpoint directly.
    ///
    /// A failed run may leave the checkpoint reflecting a partial run.
    InPlace,
}

/// Configuration for a [`DiffRun`](crate::DiffRun)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Checkpoint handling
    #[serde(default)]
    pub mode: RunMode,
    /// Fixed epoch; `None` uses the wall clock at begin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch: Option<u64>,
    /// Queued puts per flush in [`DiffRun::observe_all`](crate::DiffRun::observe_all)
    #[serde(default = "default_flush_every")]
    pub flush_every: usize,
    /// Store settings
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_flush_every() -> usize {
    DEFAULT_FLUSH_EVERY
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            mode: RunMode::default(),
            epoch: None,
            flush_every: DEFAULT_FLUSH_EVERY,
            store: StoreConfig::default(),
        }
    }
}

impl RunConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Small map and a fixed flush interval for tests
    pub fn for_testing() -> Self {
        RunConfig {
            store: StoreConfig::for_testing(),
            ..Self::default()
        }
    }

    /// Set the run mode
    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Pin the epoch instead of reading the clock
    pub fn with_epoch(mut self, epoch: u64) -> Self {
        self.epoch = Some(epoch);
        self
    }

    /// Set the flush interval
    pub fn with_flush_every(mut self, flush_every: usize) -> Self {
        self.flush_every = flush_every;
        self
    }

    /// Set the store config
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> DiffResult<()> {
        if self.flush_every == 0 {
            return Err(DiffError::InvalidConfig(
                "flush_every must be at least 1".to_string(),
            ));
        }
        self.store
            .validate()
            .map_err(|e| DiffError::InvalidConfig(e.to_string()))
    }

    /// Parse and validate a TOML run section.
    pub fn from_toml_str(content: &str) -> DiffResult<Self> {
        let config: RunConfig = toml::from_str(content)
            .map_err(|e| DiffError::InvalidConfig(format!("Failed to parse run config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> DiffResult<String> {
        toml::to_string_pretty(self).map_err(|e| {
            DiffError::InvalidConfig(format!("Failed to serialize run config: {}", e))
        })
    }
}
