//! Change classification

use std::fmt;

use checkpoint_core::StoredValue;

/// How a record changed since the previous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// No previous value
    New,
    /// Previous hash differs
    Updated,
    /// Previous hash matches
    Unchanged,
}

impl ChangeKind {
    /// Whether the pipeline has to process the record
    #[inline]
    pub fn needs_processing(self) -> bool {
        !matches!(self, ChangeKind::Unchanged)
    }

    /// Lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::New => "new",
            ChangeKind::Updated => "updated",
            ChangeKind::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a record from its previous stored value and its new hash.
///
/// Only the hash is compared; the previous epoch does not matter, and a
/// legacy value counts as a previous value.
pub fn classify(previous: Option<&StoredValue>, new_hash: &str) -> ChangeKind {
    match previous {
        None => ChangeKind::New,
        Some(value) if value.hash() == new_hash => ChangeKind::Unchanged,
        Some(_) => ChangeKind::Updated,
    }
}
