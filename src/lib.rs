//! checkpointdb - change detection for large ingestion pipelines
//!
//! A checkpoint is an LMDB directory that remembers, for every record the
//! pipeline has seen, a content hash and the epoch of the run that last saw
//! it. Each run classifies incoming records as new, updated or unchanged
//! and, at the end, reports the records it did not see as deleted, without
//! ever holding the dataset in memory.
//!
//! # Quick Start
//!
//! ```no_run
//! use checkpointdb::prelude::*;
//!
//! let mut run = DiffRun::begin("/var/lib/ingest/checkpoint", RunConfig::default())?;
//!
//! let mut fields = RecordFields::new();
//! fields.insert("name".to_string(), Some("t1".to_string()));
//! let kind = run.observe("Table", "db/t1", &fields)?;
//! assert_eq!(kind, ChangeKind::New);
//!
//! let summary = run.finish()?;
//! println!("{} deleted", summary.deleted.len());
//! # Ok::<(), checkpointdb::Error>(())
//! ```
//!
//! # Architecture
//!
//! - `checkpoint-core`: key codec, content hasher, epoch-tagged values
//! - `checkpoint-storage`: the LMDB store, batch path, stale reclamation
//!   and checkpoint directory lifecycle
//! - `checkpoint-engine`: `DiffRun`, which brackets a whole run with the
//!   copy-then-modify protocol
//!
//! This crate re-exports all three and adds a unified [`Error`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod prelude;

pub use error::{Error, Result};

pub use checkpoint_core::{
    compute_content_hash, encode_epoch_value, is_content_hash, make_key, parse_epoch_value,
    parse_key, KeyError, RecordFields, RecordKey, StoredValue, ValueError, CONTENT_HASH_LEN,
    KEY_SEPARATOR,
};
pub use checkpoint_engine::{
    classify, current_epoch, ChangeKind, DiffError, DiffRun, RunConfig, RunMode, RunStats,
    RunSummary, TrackedRecord, DEFAULT_FLUSH_EVERY,
};
pub use checkpoint_storage::{
    checkpoint_exists, checkpoint_size, cleanup_incomplete_checkpoint, copy_checkpoint,
    swap_checkpoints, BatchContext, BatchMode, BatchStats, CheckpointPaths, CheckpointStore,
    ConfigError, Items, Keys, LifecycleError, StaleSweep, StoreError, StoreResult, StoreConfig,
    DEFAULT_MAP_SIZE,
};
