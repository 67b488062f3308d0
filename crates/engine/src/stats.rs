//! Run statistics

use checkpoint_core::RecordKey;
use serde::Serialize;

use crate::classify::ChangeKind;

/// Per-kind counters for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Records seen for the first time
    pub new: u64,
    /// Records whose hash changed
    pub updated: u64,
    /// Records whose hash matched
    pub unchanged: u64,
    /// Records reclaimed as stale at finish
    pub deleted: u64,
}

impl RunStats {
    /// Count one classified record
    pub fn record(&mut self, kind: ChangeKind) {
        match kind {
            ChangeKind::New => self.new += 1,
            ChangeKind::Updated => self.updated += 1,
            ChangeKind::Unchanged => self.unchanged += 1,
        }
    }

    /// Add another set of counters
    pub fn merge(&mut self, other: &RunStats) {
        self.new += other.new;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.deleted += other.deleted;
    }

    /// Records observed during the run
    pub fn observed(&self) -> u64 {
        self.new + self.updated + self.unchanged
    }

    /// Whether anything differs from the previous run
    pub fn has_changes(&self) -> bool {
        self.new > 0 || self.updated > 0 || self.deleted > 0
    }
}

/// Outcome of a finished run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Epoch stamped on every record seen
    pub epoch: u64,
    /// Counters
    pub stats: RunStats,
    /// Records present before this run and not seen during it, in key order
    #[serde(serialize_with = "serialize_keys")]
    pub deleted: Vec<RecordKey>,
}

impl RunSummary {
    /// Whether anything differs from the previous run
    pub fn has_changes(&self) -> bool {
        self.stats.has_changes()
    }
}

fn serialize_keys<S: serde::Serializer>(keys: &[RecordKey], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(keys.iter().map(|k| k.to_string()))
}
