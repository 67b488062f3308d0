//! Full forward scans
//!
//! A scan owns one read transaction for its whole lifetime and pages
//! through the database in fixed-size chunks, resuming each page strictly
//! after the last key of the previous one. Every page reads the same
//! snapshot, so the scan as a whole sees the store as it was when the
//! transaction opened.

use std::collections::VecDeque;
use std::ops::Bound;

use checkpoint_core::RecordKey;
use heed::RoTxn;

use crate::error::StoreResult;
use crate::store::{decode_key, decode_value, CheckpointStore};

/// Entries fetched per range read.
pub const SCAN_PAGE_SIZE: usize = 1024;

/// Lazy scan of `(RecordKey, value)` pairs in composite byte order.
pub struct Items<'s> {
    store: &'s CheckpointStore,
    txn: RoTxn<'s>,
    page: VecDeque<(Vec<u8>, Vec<u8>)>,
    resume_after: Option<Vec<u8>>,
    done: bool,
}

impl<'s> Items<'s> {
    pub(crate) fn new(store: &'s CheckpointStore, txn: RoTxn<'s>) -> Self {
        Items {
            store,
            txn,
            page: VecDeque::with_capacity(SCAN_PAGE_SIZE),
            resume_after: None,
            done: false,
        }
    }

    /// Next raw `(key, value)` pair, without decoding.
    pub(crate) fn next_raw(&mut self) -> Option<StoreResult<(Vec<u8>, Vec<u8>)>> {
        if self.page.is_empty() && !self.done {
            if let Err(e) = self.fill_page() {
                self.done = true;
                return Some(Err(e));
            }
        }
        self.page.pop_front().map(Ok)
    }

    fn fill_page(&mut self) -> StoreResult<()> {
        let range: (Bound<&[u8]>, Bound<&[u8]>) = match &self.resume_after {
            Some(last) => (Bound::Excluded(last.as_slice()), Bound::Unbounded),
            None => (Bound::Unbounded, Bound::Unbounded),
        };

        let iter = self
            .store
            .db
            .range(&self.txn, &range)
            .map_err(|e| self.store.engine_error(e))?;
        for entry in iter.take(SCAN_PAGE_SIZE) {
            let (key, value) = entry.map_err(|e| self.store.engine_error(e))?;
            self.page.push_back((key.to_vec(), value.to_vec()));
        }

        if self.page.len() < SCAN_PAGE_SIZE {
            self.done = true;
        }
        self.resume_after = self.page.back().map(|(key, _)| key.clone());
        Ok(())
    }
}

impl Iterator for Items<'_> {
    type Item = StoreResult<(RecordKey, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        let (key, value) = match self.next_raw()? {
            Ok(pair) => pair,
            Err(e) => return Some(Err(e)),
        };
        Some(decode_key(&key).and_then(|key| Ok((key, decode_value(&value)?))))
    }
}

/// Lazy scan of record keys in composite byte order.
pub struct Keys<'s> {
    items: Items<'s>,
}

impl<'s> Keys<'s> {
    pub(crate) fn new(items: Items<'s>) -> Self {
        Keys { items }
    }
}

impl Iterator for Keys<'_> {
    type Item = StoreResult<RecordKey>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.items.next_raw()? {
            Ok((key, _)) => Some(decode_key(&key)),
            Err(e) => Some(Err(e)),
        }
    }
}
