//! Diff runs
//!
//! A [`DiffRun`] brackets one pass of the ingestion pipeline over a
//! checkpoint:
//!
//! 1. `begin` picks the epoch and opens the store. In copy-then-modify
//!    mode it opens a working copy next to the live checkpoint.
//! 2. `observe` / `observe_all` classify each record against its previous
//!    hash and stamp it with the current epoch, whatever the outcome.
//! 3. `finish` reclaims every key the run did not touch (the deletions),
//!    closes the store and swaps the working copy into place.
//!
//! `abort`, or dropping an unfinished run, discards the working copy and
//! leaves the previous checkpoint as it was.

use std::path::{Path, PathBuf};

use checkpoint_core::{
    compute_content_hash, encode_epoch_value, RecordFields, RecordKey, StoredValue,
};
use checkpoint_storage::{
    checkpoint_exists, cleanup_incomplete_checkpoint, copy_checkpoint, swap_checkpoints,
    BatchMode, CheckpointPaths, CheckpointStore,
};
use tracing::{debug, info, warn};

use crate::classify::{classify, ChangeKind};
use crate::config::{RunConfig, RunMode};
use crate::error::{DiffError, DiffResult};
use crate::stats::{RunStats, RunSummary};

/// One record as supplied by the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedRecord {
    /// Record identity
    pub key: RecordKey,
    /// Field values hashed for change detection
    pub fields: RecordFields,
}

impl TrackedRecord {
    /// Create a record
    pub fn new(
        type_name: impl Into<String>,
        qualified_name: impl Into<String>,
        fields: RecordFields,
    ) -> Self {
        TrackedRecord {
            key: RecordKey::new(type_name, qualified_name),
            fields,
        }
    }

    /// Content hash of the fields
    pub fn content_hash(&self) -> String {
        compute_content_hash(&self.fields)
    }
}

/// Current wall-clock epoch in seconds.
pub fn current_epoch() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

/// A diff run in progress over one checkpoint.
pub struct DiffRun {
    paths: CheckpointPaths,
    mode: RunMode,
    flush_every: usize,
    epoch: u64,
    store: Option<CheckpointStore>,
    stats: RunStats,
    finished: bool,
}

impl DiffRun {
    /// Start a run over the checkpoint at `checkpoint_dir`.
    ///
    /// A missing checkpoint starts empty, so every record of the first run
    /// is new.
    pub fn begin(checkpoint_dir: impl Into<PathBuf>, config: RunConfig) -> DiffResult<Self> {
        config.validate()?;
        let paths = CheckpointPaths::new(checkpoint_dir);
        let epoch = config.epoch.unwrap_or_else(current_epoch);

        let store_dir = match config.mode {
            RunMode::CopyThenModify => {
                if checkpoint_exists(paths.live()) {
                    copy_checkpoint(paths.live(), paths.working())?;
                } else {
                    cleanup_incomplete_checkpoint(paths.working())?;
                }
                paths.working()
            }
            RunMode::InPlace => paths.live(),
        };

        let store = match CheckpointStore::open_with_config(store_dir, config.store.clone()) {
            Ok(store) => store,
            Err(e) => {
                if config.mode == RunMode::CopyThenModify {
                    cleanup_incomplete_checkpoint(paths.working())?;
                }
                return Err(e.into());
            }
        };

        info!(
            target: "checkpoint::run",
            checkpoint = %paths.live().display(),
            epoch,
            mode = ?config.mode,
            "Diff run started"
        );

        Ok(DiffRun {
            paths,
            mode: config.mode,
            flush_every: config.flush_every,
            epoch,
            store: Some(store),
            stats: RunStats::default(),
            finished: false,
        })
    }

    /// Epoch stamped on every record this run sees
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Checkpoint handling of this run
    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Counters so far
    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Live checkpoint directory
    pub fn checkpoint_dir(&self) -> &Path {
        self.paths.live()
    }

    /// Directory the run is writing to
    pub fn store_dir(&self) -> &Path {
        match self.mode {
            RunMode::CopyThenModify => self.paths.working(),
            RunMode::InPlace => self.paths.live(),
        }
    }

    /// Open store. Tests use this to inspect the working copy.
    pub fn store(&self) -> DiffResult<&CheckpointStore> {
        self.store.as_ref().ok_or(DiffError::Finished)
    }

    /// Look up a record's previous value without touching it.
    pub fn previous(
        &self,
        type_name: &str,
        qualified_name: &str,
    ) -> DiffResult<Option<StoredValue>> {
        Ok(self.store()?.get_value(type_name, qualified_name)?)
    }

    /// Classify one record and stamp it with this run's epoch.
    ///
    /// Commits before returning. Use [`DiffRun::observe_all`] for bulk input.
    pub fn observe<'a, F>(
        &mut self,
        type_name: &str,
        qualified_name: &str,
        fields: F,
    ) -> DiffResult<ChangeKind>
    where
        F: IntoIterator<Item = (&'a String, &'a Option<String>)>,
    {
        RecordKey::new(type_name, qualified_name).validate()?;
        let store = self.store.as_ref().ok_or(DiffError::Finished)?;

        let hash = compute_content_hash(fields);
        let previous = store.get_value(type_name, qualified_name)?;
        let kind = classify(previous.as_ref(), &hash);
        store.put(
            type_name,
            qualified_name,
            &encode_epoch_value(self.epoch, &hash),
        )?;

        self.stats.record(kind);
        Ok(kind)
    }

    /// Classify a stream of records through one batch transaction.
    ///
    /// Puts are flushed every `flush_every` records and once more at the
    /// end. `on_change` sees every record with its classification. On error
    /// the unflushed tail is discarded; earlier flushes stay committed to
    /// the store being written.
    ///
    /// Reads go to the store, not the pending buffer, so a key repeated
    /// within one flush window is classified against the previous run both
    /// times.
    pub fn observe_all<I, F>(&mut self, records: I, mut on_change: F) -> DiffResult<RunStats>
    where
        I: IntoIterator<Item = TrackedRecord>,
        F: FnMut(&TrackedRecord, ChangeKind),
    {
        let store = self.store.as_ref().ok_or(DiffError::Finished)?;
        let epoch = self.epoch;
        let flush_every = self.flush_every;

        let observed = store.batch_transaction(BatchMode::Write, |batch| {
            let mut stats = RunStats::default();
            for record in records {
                record.key.validate()?;
                let RecordKey {
                    type_name,
                    qualified_name,
                } = &record.key;

                let hash = record.content_hash();
                let previous = batch.get_value(type_name, qualified_name)?;
                let kind = classify(previous.as_ref(), &hash);
                batch.put(type_name, qualified_name, &encode_epoch_value(epoch, &hash))?;

                stats.record(kind);
                on_change(&record, kind);

                if batch.pending_len() >= flush_every {
                    batch.flush_puts()?;
                }
            }
            Ok::<_, DiffError>(stats)
        })?;

        debug!(
            target: "checkpoint::run",
            observed = observed.observed(),
            new = observed.new,
            updated = observed.updated,
            "Observed record batch"
        );
        self.stats.merge(&observed);
        Ok(observed)
    }

    /// Reclaim stale records, close the store and publish the checkpoint.
    pub fn finish(self) -> DiffResult<RunSummary> {
        let epoch = self.epoch;
        let mut deleted = Vec::new();
        let stats = self.finish_with(|key| deleted.push(key))?;
        Ok(RunSummary {
            epoch,
            stats,
            deleted,
        })
    }

    /// Like [`DiffRun::finish`], streaming deletions to `on_deleted`
    /// instead of collecting them.
    ///
    /// Deletions are committed only after the last one is delivered. If
    /// the run fails here, the working copy is discarded and callers must
    /// not act on deletions already delivered.
    pub fn finish_with<F>(mut self, mut on_deleted: F) -> DiffResult<RunStats>
    where
        F: FnMut(RecordKey),
    {
        let store = self.store.take().ok_or(DiffError::Finished)?;

        let mut deleted = 0u64;
        for key in store.delete_stale_epochs(self.epoch)? {
            on_deleted(key?);
            deleted += 1;
        }
        self.stats.deleted += deleted;
        store.close();

        // From here on a failure keeps the working copy on disk for inspection.
        self.finished = true;
        if self.mode == RunMode::CopyThenModify {
            swap_checkpoints(self.paths.working(), self.paths.live())?;
        }

        info!(
            target: "checkpoint::run",
            checkpoint = %self.paths.live().display(),
            epoch = self.epoch,
            new = self.stats.new,
            updated = self.stats.updated,
            unchanged = self.stats.unchanged,
            deleted = self.stats.deleted,
            "Diff run complete"
        );
        Ok(self.stats)
    }

    /// Discard the run. The previous checkpoint stays as it was in
    /// copy-then-modify mode.
    pub fn abort(mut self) -> DiffResult<()> {
        if let Some(store) = self.store.take() {
            store.close();
        }
        self.finished = true;
        if self.mode == RunMode::CopyThenModify {
            cleanup_incomplete_checkpoint(self.paths.working())?;
        }
        info!(
            target: "checkpoint::run",
            checkpoint = %self.paths.live().display(),
            epoch = self.epoch,
            "Diff run aborted"
        );
        Ok(())
    }
}

impl Drop for DiffRun {
    fn drop(&mut self) {
        if let Some(store) = self.store.take() {
            store.close();
        }
        if self.finished || self.mode != RunMode::CopyThenModify {
            return;
        }
        warn!(
            target: "checkpoint::run",
            working = %self.paths.working().display(),
            "Diff run dropped before finish, discarding working copy"
        );
        if let Err(e) = cleanup_incomplete_checkpoint(self.paths.working()) {
            warn!(target: "checkpoint::run", error = %e, "Failed to discard working copy");
        }
    }
}

impl std::fmt::Debug for DiffRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiffRun")
            .field("checkpoint", &self.paths.live())
            .field("mode", &self.mode)
            .field("epoch", &self.epoch)
            .field("stats", &self.stats)
            .field("finished", &self.finished)
            .finish()
    }
}
