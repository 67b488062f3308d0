//! Common imports
//!
//! ```
//! use checkpointdb::prelude::*;
//! ```

pub use crate::error::{Error, Result};
pub use checkpoint_core::{compute_content_hash, RecordFields, RecordKey, StoredValue};
pub use checkpoint_engine::{ChangeKind, DiffRun, RunConfig, RunMode, RunSummary, TrackedRecord};
pub use checkpoint_storage::{BatchMode, CheckpointStore, StoreConfig};
