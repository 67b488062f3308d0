//! Store configuration
//!
//! The store has two tunables: the maximum map size and the reader slot
//! count. Both are plain constructor arguments; the struct derives serde so
//! callers can embed it in their own configuration.

use serde::{Deserialize, Serialize};

/// Default maximum database size: 100 GiB.
///
/// LMDB maps the file sparsely, so this is an address-space reservation,
/// not disk usage. It is large enough that checkpoints never need resizing.
pub const DEFAULT_MAP_SIZE: usize = 100 * 1024 * 1024 * 1024;

/// Map size used by [`StoreConfig::for_testing`]: 64 MiB.
pub const TESTING_MAP_SIZE: usize = 64 * 1024 * 1024;

/// Smallest accepted map size: 1 MiB.
pub const MIN_MAP_SIZE: usize = 1024 * 1024;

/// Default number of concurrent read transactions (LMDB's own default).
pub const DEFAULT_MAX_READERS: u32 = 126;

/// Configuration for opening a [`CheckpointStore`](crate::CheckpointStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum database size in bytes
    #[serde(default = "default_map_size")]
    pub map_size: usize,
    /// Maximum concurrent read transactions
    #[serde(default = "default_max_readers")]
    pub max_readers: u32,
}

fn default_map_size() -> usize {
    DEFAULT_MAP_SIZE
}

fn default_max_readers() -> u32 {
    DEFAULT_MAX_READERS
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            map_size: DEFAULT_MAP_SIZE,
            max_readers: DEFAULT_MAX_READERS,
        }
    }
}

impl StoreConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Small map suitable for unit tests
    pub fn for_testing() -> Self {
        StoreConfig {
            map_size: TESTING_MAP_SIZE,
            ..Self::default()
        }
    }

    /// Set the maximum map size
    pub fn with_map_size(mut self, map_size: usize) -> Self {
        self.map_size = map_size;
        self
    }

    /// Set the maximum number of concurrent readers
    pub fn with_max_readers(mut self, max_readers: u32) -> Self {
        self.max_readers = max_readers;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.map_size < MIN_MAP_SIZE {
            return Err(ConfigError::MapSizeTooSmall {
                map_size: self.map_size,
                min: MIN_MAP_SIZE,
            });
        }
        if self.max_readers == 0 {
            return Err(ConfigError::NoReaders);
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Map size below the minimum
    #[error("map_size {map_size} is below the minimum of {min} bytes")]
    MapSizeTooSmall {
        /// Requested map size
        map_size: usize,
        /// Minimum accepted map size
        min: usize,
    },

    /// Zero reader slots
    #[error("max_readers must be at least 1")]
    NoReaders,
}
