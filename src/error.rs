//! Unified error type
//!
//! Every layer keeps its own error enum. `Error` wraps them so callers of
//! the facade handle one type and can still ask what kind of failure it
//! was:
//!
//! - corruption: a stored key or value no longer decodes, rebuild the
//!   checkpoint
//! - resource exhaustion: the map or the disk is full, nothing is retried
//! - everything else is propagated as-is

use checkpoint_core::{KeyError, ValueError};
use checkpoint_engine::DiffError;
use checkpoint_storage::{ConfigError, LifecycleError, StoreError};

/// Result type alias for the facade
pub type Result<T> = std::result::Result<T, Error>;

/// Any error raised by checkpointdb
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Key encoding or validation failed
    #[error(transparent)]
    Key(#[from] KeyError),

    /// Stored value could not be decoded
    #[error(transparent)]
    Value(#[from] ValueError),

    /// Store configuration rejected
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Store operation failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Checkpoint copy, swap or cleanup failed
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Diff run failed
    #[error(transparent)]
    Diff(#[from] DiffError),
}

impl From<checkpoint_core::Error> for Error {
    fn from(e: checkpoint_core::Error) -> Self {
        match e {
            checkpoint_core::Error::Key(k) => Error::Key(k),
            checkpoint_core::Error::Value(v) => Error::Value(v),
        }
    }
}

impl Error {
    /// Whether the checkpoint holds data that no longer decodes
    pub fn is_corruption(&self) -> bool {
        match self {
            Error::Key(e) => e.is_corruption(),
            Error::Value(_) => true,
            Error::Store(e) => e.is_corruption(),
            Error::Diff(e) => e.is_corruption(),
            Error::Config(_) | Error::Lifecycle(_) => false,
        }
    }

    /// Whether the map or the disk is full
    pub fn is_resource_exhausted(&self) -> bool {
        match self {
            Error::Store(e) => e.is_resource_exhausted(),
            Error::Lifecycle(e) => e.is_disk_full(),
            Error::Diff(e) => e.is_resource_exhausted(),
            Error::Key(_) | Error::Value(_) | Error::Config(_) => false,
        }
    }

    /// Whether the caller passed an unusable record or configuration
    pub fn is_invalid_input(&self) -> bool {
        match self {
            Error::Key(e) => !e.is_corruption(),
            Error::Config(_) => true,
            Error::Diff(DiffError::InvalidRecord(_) | DiffError::InvalidConfig(_)) => true,
            _ => false,
        }
    }
}
