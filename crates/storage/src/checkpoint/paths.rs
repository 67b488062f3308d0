//! Checkpoint directory layout

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// LMDB main data file inside a checkpoint directory
pub const DATA_FILE: &str = "data.mdb";

/// LMDB lock file inside a checkpoint directory
pub const LOCK_FILE: &str = "lock.mdb";

/// Suffix appended to the live directory name to form the working copy
pub const WORKING_SUFFIX: &str = ".working";

/// Live checkpoint directory and its sibling working copy.
///
/// `/data/ckpt` pairs with `/data/ckpt.working`. Both share a parent, so
/// swapping one onto the other is a same-filesystem rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointPaths {
    live: PathBuf,
    working: PathBuf,
}

impl CheckpointPaths {
    /// Derive the layout for a live checkpoint directory.
    pub fn new(live: impl Into<PathBuf>) -> Self {
        let live = live.into();
        let mut name: OsString = live
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("checkpoint"));
        name.push(WORKING_SUFFIX);
        let working = match live.parent() {
            Some(parent) => parent.join(name),
            None => PathBuf::from(name),
        };
        CheckpointPaths { live, working }
    }

    /// Live checkpoint directory
    pub fn live(&self) -> &Path {
        &self.live
    }

    /// Working copy directory
    pub fn working(&self) -> &Path {
        &self.working
    }

    /// Main data file of the live checkpoint
    pub fn data_file(&self) -> PathBuf {
        self.live.join(DATA_FILE)
    }

    /// Lock file of the live checkpoint
    pub fn lock_file(&self) -> PathBuf {
        self.live.join(LOCK_FILE)
    }
}
