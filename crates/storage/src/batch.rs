//! Batched transactions
//!
//! The single-key API pays for one transaction per call. For tight loops
//! over millions of records, [`CheckpointStore::batch_transaction`] opens
//! one transaction for the whole scope instead:
//!
//! - `get` reads against the open transaction
//! - `put` queues the pair in a pending buffer
//! - `flush_puts` writes the buffer in key order and commits
//! - `delete` applies immediately
//!
//! Each flush is one all-or-nothing commit, after which a fresh write
//! transaction continues the scope. When the closure returns `Ok`, pending
//! puts are flushed automatically. When it returns `Err`, the open
//! transaction is aborted and pending puts are discarded; earlier flushes
//! stay committed.

use checkpoint_core::{make_key, StoredValue};
use heed::{RoTxn, RwTxn};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::store::{decode_value, CheckpointStore};

/// Access mode of a batch transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    /// Read-only snapshot; `put` and `delete` fail
    Read,
    /// Read-write with a pending-put buffer
    Write,
}

/// Counters for one batch scope
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Reads served by the batch
    pub gets: u64,
    /// Puts written by flushes
    pub puts_flushed: u64,
    /// Deletes that removed a key
    pub deletes: u64,
    /// Commits performed by flushes
    pub commits: u64,
}

enum BatchTxn<'s> {
    Read(RoTxn<'s>),
    Write(RwTxn<'s>),
}

impl<'s> BatchTxn<'s> {
    fn ro(&self) -> &RoTxn<'s> {
        match self {
            BatchTxn::Read(txn) => txn,
            BatchTxn::Write(txn) => &**txn,
        }
    }
}

/// One long-lived transaction plus a pending-put buffer.
///
/// Only obtainable through [`CheckpointStore::batch_transaction`].
pub struct BatchContext<'s> {
    store: &'s CheckpointStore,
    mode: BatchMode,
    txn: Option<BatchTxn<'s>>,
    pending: Vec<(Vec<u8>, Vec<u8>)>,
    stats: BatchStats,
}

impl<'s> BatchContext<'s> {
    fn begin(store: &'s CheckpointStore, mode: BatchMode) -> StoreResult<Self> {
        let txn = match mode {
            BatchMode::Read => {
                BatchTxn::Read(store.env.read_txn().map_err(|e| store.engine_error(e))?)
            }
            BatchMode::Write => {
                BatchTxn::Write(store.env.write_txn().map_err(|e| store.engine_error(e))?)
            }
        };
        Ok(BatchContext {
            store,
            mode,
            txn: Some(txn),
            pending: Vec::new(),
            stats: BatchStats::default(),
        })
    }

    /// Access mode of this batch
    pub fn mode(&self) -> BatchMode {
        self.mode
    }

    /// Read a record's stored value through the open transaction.
    ///
    /// Queued puts are not visible until flushed.
    pub fn get(&mut self, type_name: &str, qualified_name: &str) -> StoreResult<Option<String>> {
        let key = make_key(type_name, qualified_name);
        let txn = self.txn.as_ref().ok_or(StoreError::TransactionClosed)?;
        let found = self
            .store
            .db
            .get(txn.ro(), key.as_slice())
            .map_err(|e| self.store.engine_error(e))?;
        self.stats.gets += 1;
        found.map(decode_value).transpose()
    }

    /// Read and decode a record's stored value.
    pub fn get_value(
        &mut self,
        type_name: &str,
        qualified_name: &str,
    ) -> StoreResult<Option<StoredValue>> {
        match self.get(type_name, qualified_name)? {
            Some(raw) => Ok(Some(StoredValue::parse(&raw)?)),
            None => Ok(None),
        }
    }

    /// Queue a put. Nothing is written until the next flush.
    pub fn put(&mut self, type_name: &str, qualified_name: &str, value: &str) -> StoreResult<()> {
        if self.mode == BatchMode::Read {
            return Err(StoreError::ReadOnlyTransaction);
        }
        self.pending.push((
            make_key(type_name, qualified_name),
            value.as_bytes().to_vec(),
        ));
        Ok(())
    }

    /// Delete a record immediately. Returns whether it existed.
    pub fn delete(&mut self, type_name: &str, qualified_name: &str) -> StoreResult<bool> {
        let key = make_key(type_name, qualified_name);
        let txn = match self.txn.as_mut() {
            Some(BatchTxn::Write(txn)) => txn,
            Some(BatchTxn::Read(_)) => return Err(StoreError::ReadOnlyTransaction),
            None => return Err(StoreError::TransactionClosed),
        };
        let existed = self
            .store
            .db
            .delete(txn, key.as_slice())
            .map_err(|e| self.store.engine_error(e))?;
        if existed {
            self.stats.deletes += 1;
        }
        Ok(existed)
    }

    /// Write all pending puts in key order and commit.
    ///
    /// Returns the number of pairs written. A fresh write transaction
    /// continues the scope afterwards. If the commit fails the batch is
    /// closed and every later call returns `TransactionClosed`.
    pub fn flush_puts(&mut self) -> StoreResult<usize> {
        if self.mode == BatchMode::Read {
            return Err(StoreError::ReadOnlyTransaction);
        }
        let mut txn = match self.txn.take() {
            Some(BatchTxn::Write(txn)) => txn,
            Some(other) => {
                self.txn = Some(other);
                return Err(StoreError::ReadOnlyTransaction);
            }
            None => return Err(StoreError::TransactionClosed),
        };

        // Stable sort keeps the last queued value for a repeated key last.
        let mut pending = std::mem::take(&mut self.pending);
        pending.sort_by(|a, b| a.0.cmp(&b.0));
        let count = pending.len();

        for (key, value) in &pending {
            self.store
                .db
                .put(&mut txn, key.as_slice(), value.as_slice())
                .map_err(|e| self.store.engine_error(e))?;
        }
        txn.commit().map_err(|e| self.store.engine_error(e))?;

        self.stats.puts_flushed += count as u64;
        self.stats.commits += 1;
        debug!(
            target: "checkpoint::batch",
            count,
            commits = self.stats.commits,
            "Flushed pending puts"
        );

        let next = self
            .store
            .env
            .write_txn()
            .map_err(|e| self.store.engine_error(e))?;
        self.txn = Some(BatchTxn::Write(next));
        Ok(count)
    }

    /// Number of queued, unflushed puts
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Counters for this scope so far
    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    /// Flush what is pending and commit the open transaction.
    fn finish(mut self) -> StoreResult<BatchStats> {
        if self.mode == BatchMode::Write {
            if !self.pending.is_empty() {
                self.flush_puts()?;
            }
            if let Some(BatchTxn::Write(txn)) = self.txn.take() {
                // Commits deletes issued since the last flush.
                txn.commit().map_err(|e| self.store.engine_error(e))?;
            }
        }
        Ok(self.stats)
    }

    fn abort(mut self) {
        if !self.pending.is_empty() {
            debug!(
                target: "checkpoint::batch",
                discarded = self.pending.len(),
                "Discarding pending puts"
            );
        }
        self.pending.clear();
        // Dropping a heed transaction aborts it.
        self.txn = None;
    }
}

impl CheckpointStore {
    /// Run `f` inside one long-lived transaction.
    ///
    /// On `Ok`, pending puts are flushed and the transaction committed.
    /// On `Err`, the transaction is aborted and unflushed puts discarded.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use checkpoint_storage::{BatchMode, CheckpointStore, StoreError};
    ///
    /// let store = CheckpointStore::open("/tmp/checkpoint")?;
    /// let written = store.batch_transaction(BatchMode::Write, |batch| {
    ///     for i in 0..50_000 {
    ///         batch.put("Table", &format!("db/t{}", i), "1:0123456789abcdef0123456789abcdef")?;
    ///         if batch.pending_len() >= 10_000 {
    ///             batch.flush_puts()?;
    ///         }
    ///     }
    ///     Ok::<_, StoreError>(batch.stats().puts_flushed + batch.pending_len() as u64)
    /// })?;
    /// assert_eq!(written, 50_000);
    /// # Ok::<(), StoreError>(())
    /// ```
    pub fn batch_transaction<F, T, E>(&self, mode: BatchMode, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut BatchContext<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut batch = BatchContext::begin(self, mode)?;
        match f(&mut batch) {
            Ok(value) => {
                batch.finish()?;
                Ok(value)
            }
            Err(e) => {
                batch.abort();
                Err(e)
            }
        }
    }
}
