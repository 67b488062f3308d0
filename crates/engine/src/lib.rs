//! Diff engine for checkpointdb
//!
//! This crate combines the codecs and the checkpoint store into the
//! pipeline-facing contract:
//! - `DiffRun`: one ingestion pass over a checkpoint (begin, observe, finish)
//! - `classify`: new / updated / unchanged from a previous value and a new hash
//! - `RunConfig`: run mode, epoch, flush interval, store settings
//! - `RunSummary` / `RunStats`: what changed, including deletions
//!
//! # Example
//!
//! ```no_run
//! use std::collections::HashMap;
//! use checkpoint_engine::{ChangeKind, DiffRun, RunConfig};
//!
//! let mut run = DiffRun::begin("/var/lib/ingest/checkpoint", RunConfig::default())?;
//!
//! let mut fields = HashMap::new();
//! fields.insert("name".to_string(), Some("t1".to_string()));
//! if run.observe("Table", "db/t1", &fields)? != ChangeKind::Unchanged {
//!     // process the record
//! }
//!
//! let summary = run.finish()?;
//! for key in &summary.deleted {
//!     println!("deleted upstream: {}", key);
//! }
//! # Ok::<(), checkpoint_engine::DiffError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod classify;
pub mod config;
pub mod error;
pub mod run;
pub mod stats;

pub use classify::{classify, ChangeKind};
pub use config::{RunConfig, RunMode, DEFAULT_FLUSH_EVERY};
pub use error::{DiffError, DiffResult};
pub use run::{current_epoch, DiffRun, TrackedRecord};
pub use stats::{RunStats, RunSummary};
