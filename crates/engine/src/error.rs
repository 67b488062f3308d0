//! Diff run errors

use checkpoint_core::KeyError;
use checkpoint_storage::{LifecycleError, StoreError};

/// Result type alias for diff runs
pub type DiffResult<T> = std::result::Result<T, DiffError>;

/// Errors raised while running a diff against a checkpoint
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// Store operation failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Checkpoint copy, swap or cleanup failed
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Incoming record has an unusable identity
    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] KeyError),

    /// Run configuration rejected
    #[error("Invalid run configuration: {0}")]
    InvalidConfig(String),

    /// The run was already finished or aborted
    #[error("Diff run already finished")]
    Finished,
}

impl DiffError {
    /// Whether the checkpoint should be treated as damaged
    pub fn is_corruption(&self) -> bool {
        match self {
            DiffError::Store(e) => e.is_corruption(),
            _ => false,
        }
    }

    /// Whether the run ran out of map space or disk
    pub fn is_resource_exhausted(&self) -> bool {
        match self {
            DiffError::Store(e) => e.is_resource_exhausted(),
            DiffError::Lifecycle(e) => e.is_disk_full(),
            _ => false,
        }
    }
}
