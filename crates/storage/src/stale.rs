//! Stale-epoch reclamation
//!
//! After a run at epoch E has touched every live record, any key still
//! carrying an older epoch (or no epoch at all) belongs to a record that
//! disappeared upstream. Reclaiming those keys happens in two phases:
//!
//! 1. A read transaction scans the whole store and collects the stale keys.
//!    Memory grows with the number of stale keys, not the store size.
//! 2. One write transaction deletes the collected keys, one per
//!    [`StaleSweep::next`] call, and commits when the sweep is exhausted.
//!
//! The phases never mutate the B-tree under a live cursor. Between them a
//! concurrent writer could add a stale-looking key; with one writer per
//! checkpoint that window is accepted.

use checkpoint_core::{RecordKey, StoredValue};
use heed::RwTxn;
use tracing::debug;

use crate::error::StoreResult;
use crate::store::{decode_key, CheckpointStore};

/// Deletion pass over the stale keys found by
/// [`CheckpointStore::delete_stale_epochs`].
///
/// Yields each deleted record. Deletions are committed only when the
/// iterator returns `None`; dropping the sweep earlier aborts the write
/// transaction and nothing is deleted.
pub struct StaleSweep<'s> {
    store: &'s CheckpointStore,
    txn: Option<RwTxn<'s>>,
    candidates: std::vec::IntoIter<(Vec<u8>, RecordKey)>,
    total: usize,
    deleted: usize,
}

impl<'s> StaleSweep<'s> {
    /// Number of stale keys found by the scan phase
    pub fn total(&self) -> usize {
        self.total
    }

    /// Keys deleted so far (uncommitted until the sweep is exhausted)
    pub fn deleted(&self) -> usize {
        self.deleted
    }
}

impl Iterator for StaleSweep<'_> {
    type Item = StoreResult<RecordKey>;

    fn next(&mut self) -> Option<Self::Item> {
        let txn = self.txn.as_mut()?;

        match self.candidates.next() {
            Some((raw, key)) => match self.store.db.delete(txn, raw.as_slice()) {
                Ok(_) => {
                    self.deleted += 1;
                    Some(Ok(key))
                }
                Err(e) => {
                    self.txn = None;
                    Some(Err(self.store.engine_error(e)))
                }
            },
            None => {
                let txn = self.txn.take()?;
                match txn.commit() {
                    Ok(()) => {
                        debug!(
                            target: "checkpoint::stale",
                            deleted = self.deleted,
                            "Committed stale sweep"
                        );
                        None
                    }
                    Err(e) => Some(Err(self.store.engine_error(e))),
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.txn.is_none() {
            return (0, Some(0));
        }
        let remaining = self.candidates.len();
        // The commit step may yield one error after the last key.
        (remaining, Some(remaining + 1))
    }
}

impl Drop for StaleSweep<'_> {
    fn drop(&mut self) {
        if self.txn.is_some() && self.deleted > 0 {
            debug!(
                target: "checkpoint::stale",
                deleted = self.deleted,
                total = self.total,
                "Stale sweep dropped before completion, aborting"
            );
        }
    }
}

impl CheckpointStore {
    /// Find every key stale relative to `current_epoch` and return a sweep
    /// that deletes them.
    ///
    /// A key is stale when its value has no epoch or an epoch below
    /// `current_epoch`. Candidates are yielded in composite key order. A
    /// value that fails to decode aborts the scan with a corruption error.
    pub fn delete_stale_epochs(&self, current_epoch: u64) -> StoreResult<StaleSweep<'_>> {
        let mut candidates = Vec::new();
        let mut scanned = 0u64;
        {
            let mut items = self.items()?;
            while let Some(entry) = items.next_raw() {
                let (raw_key, raw_value) = entry?;
                scanned += 1;
                let value = StoredValue::from_bytes(&raw_value)?;
                if value.is_stale(current_epoch) {
                    let key = decode_key(&raw_key)?;
                    candidates.push((raw_key, key));
                }
            }
        }

        debug!(
            target: "checkpoint::stale",
            current_epoch,
            scanned,
            stale = candidates.len(),
            "Collected stale keys"
        );

        let txn = self.env.write_txn().map_err(|e| self.engine_error(e))?;
        Ok(StaleSweep {
            store: self,
            txn: Some(txn),
            total: candidates.len(),
            candidates: candidates.into_iter(),
            deleted: 0,
        })
    }

    /// Delete every stale key and return them, committing once.
    pub fn purge_stale(&self, current_epoch: u64) -> StoreResult<Vec<RecordKey>> {
        self.delete_stale_epochs(current_epoch)?.collect()
    }
}
