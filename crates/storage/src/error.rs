//! Storage layer errors

use std::path::PathBuf;

use checkpoint_core::{KeyError, ValueError};

use crate::config::ConfigError;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors from the transactional store engine
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying LMDB error
    #[error("Engine error: {0}")]
    Engine(#[from] heed::Error),

    /// The memory map is full; the checkpoint needs a larger `map_size`
    #[error("Checkpoint map is full (map_size = {map_size} bytes)")]
    MapFull {
        /// Configured map size
        map_size: usize,
    },

    /// Stored key could not be decoded
    #[error("Corrupt key: {0}")]
    Key(#[from] KeyError),

    /// Stored value could not be decoded
    #[error("Corrupt value: {0}")]
    Value(#[from] ValueError),

    /// Write attempted through a read-only batch
    #[error("Batch transaction is read-only")]
    ReadOnlyTransaction,

    /// Batch transaction is no longer usable (a previous commit failed)
    #[error("Batch transaction is closed")]
    TransactionClosed,

    /// Filesystem error while preparing the checkpoint directory
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Invalid store configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl StoreError {
    /// Wrap an engine error, recognising a full map.
    pub(crate) fn engine(err: heed::Error, map_size: usize) -> Self {
        match err {
            heed::Error::Mdb(heed::MdbError::MapFull) => StoreError::MapFull { map_size },
            other => StoreError::Engine(other),
        }
    }

    /// Whether the error means stored data is damaged
    pub fn is_corruption(&self) -> bool {
        match self {
            StoreError::Key(e) => e.is_corruption(),
            StoreError::Value(_) => true,
            StoreError::Engine(heed::Error::Mdb(heed::MdbError::Corrupted)) => true,
            _ => false,
        }
    }

    /// Whether the error is resource exhaustion (map or disk full)
    pub fn is_resource_exhausted(&self) -> bool {
        match self {
            StoreError::MapFull { .. } => true,
            StoreError::Engine(heed::Error::Mdb(heed::MdbError::MapFull)) => true,
            StoreError::Engine(heed::Error::Io(e)) | StoreError::Io { source: e, .. } => {
                e.raw_os_error() == Some(28) // ENOSPC
            }
            _ => false,
        }
    }
}

impl From<checkpoint_core::Error> for StoreError {
    fn from(e: checkpoint_core::Error) -> Self {
        match e {
            checkpoint_core::Error::Key(k) => StoreError::Key(k),
            checkpoint_core::Error::Value(v) => StoreError::Value(v),
        }
    }
}
