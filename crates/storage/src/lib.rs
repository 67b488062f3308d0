//! Storage layer for checkpointdb
//!
//! This crate implements the LMDB-backed checkpoint store:
//! - `CheckpointStore`: single-key get/put/delete, each in its own transaction
//! - Batch transactions with a pending-put buffer and explicit flushes
//! - Snapshot scans (`keys`, `items`) paged over one read transaction
//! - Two-phase stale-epoch reclamation
//! - Checkpoint lifecycle: copy, swap, cleanup of whole checkpoint directories
//!
//! # Layout
//!
//! One checkpoint is one directory holding LMDB's `data.mdb` and
//! `lock.mdb`. Keys are composite `type:qualified_name` bytes; values are
//! epoch-tagged content hashes (see `checkpoint-core`).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod scan;
pub mod stale;
pub mod store;

pub use batch::{BatchContext, BatchMode, BatchStats};
pub use checkpoint::{
    checkpoint_exists, checkpoint_size, cleanup_incomplete_checkpoint, copy_checkpoint,
    swap_checkpoints, CheckpointPaths, LifecycleError,
};
pub use config::{ConfigError, StoreConfig, DEFAULT_MAP_SIZE};
pub use error::{StoreError, StoreResult};
pub use scan::{Items, Keys};
pub use stale::StaleSweep;
pub use store::CheckpointStore;
