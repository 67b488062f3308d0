//! Checkpoint store over an LMDB environment
//!
//! `CheckpointStore` owns one `heed::Env` opened on a checkpoint directory
//! and the unnamed database inside it. Every single-key operation runs in
//! its own short transaction:
//!
//! - `get` opens a read transaction
//! - `put` / `delete` open a write transaction and commit before returning
//!
//! Tight loops should use [`CheckpointStore::batch_transaction`] instead,
//! which keeps one transaction open for the whole scope.
//!
//! ## Ownership
//!
//! The store is an explicit owned resource. Several stores over different
//! directories coexist in one process; the same directory must not be
//! opened twice at once. `close()` consumes the store and waits until the
//! environment is released, so the directory can be copied, renamed or
//! reopened immediately afterwards.

use std::path::{Path, PathBuf};

use checkpoint_core::{make_key, RecordKey, StoredValue, ValueError};
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::scan::{Items, Keys};

/// Embedded, transactional key-value store backing one checkpoint.
///
/// Read transactions are not bound to a thread's reader slot, so a lookup
/// may run while a scan or a read batch holds its own snapshot.
pub struct CheckpointStore {
    pub(crate) env: Env,
    pub(crate) db: Database<Bytes, Bytes>,
    path: PathBuf,
    config: StoreConfig,
}

impl CheckpointStore {
    /// Open (or create) a checkpoint at `path` with the default config.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use checkpoint_storage::CheckpointStore;
    ///
    /// let store = CheckpointStore::open("/var/lib/ingest/checkpoint")?;
    /// store.put("Table", "db/t1", "100:0123456789abcdef0123456789abcdef")?;
    /// store.close();
    /// # Ok::<(), checkpoint_storage::StoreError>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with_config(path, StoreConfig::default())
    }

    /// Open (or create) a checkpoint at `path` with an explicit config.
    ///
    /// The directory is created if missing.
    pub fn open_with_config(path: impl AsRef<Path>, config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let path = path.as_ref().to_path_buf();

        std::fs::create_dir_all(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        // SAFETY: the checkpoint directory is owned by a single store at a
        // time and its files are never modified outside LMDB while open.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(config.map_size)
                .max_readers(config.max_readers)
                .open(&path)
        }
        .map_err(|e| StoreError::engine(e, config.map_size))?;

        let mut wtxn = env
            .write_txn()
            .map_err(|e| StoreError::engine(e, config.map_size))?;
        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| StoreError::engine(e, config.map_size))?;
        wtxn.commit()
            .map_err(|e| StoreError::engine(e, config.map_size))?;

        debug!(
            target: "checkpoint::store",
            path = %path.display(),
            map_size = config.map_size,
            "Opened checkpoint store"
        );

        Ok(CheckpointStore {
            env,
            db,
            path,
            config,
        })
    }

    /// Directory this store was opened on
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configuration this store was opened with
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Get the raw stored value for a record, if present.
    pub fn get(&self, type_name: &str, qualified_name: &str) -> StoreResult<Option<String>> {
        let rtxn = self.env.read_txn().map_err(|e| self.engine_error(e))?;
        let key = make_key(type_name, qualified_name);
        match self
            .db
            .get(&rtxn, key.as_slice())
            .map_err(|e| self.engine_error(e))?
        {
            Some(bytes) => Ok(Some(decode_value(bytes)?)),
            None => Ok(None),
        }
    }

    /// Get the decoded stored value for a record, if present.
    pub fn get_value(
        &self,
        type_name: &str,
        qualified_name: &str,
    ) -> StoreResult<Option<StoredValue>> {
        match self.get(type_name, qualified_name)? {
            Some(raw) => Ok(Some(StoredValue::parse(&raw)?)),
            None => Ok(None),
        }
    }

    /// Upsert a record's value. Committed before returning.
    pub fn put(&self, type_name: &str, qualified_name: &str, value: &str) -> StoreResult<()> {
        let key = make_key(type_name, qualified_name);
        let mut wtxn = self.env.write_txn().map_err(|e| self.engine_error(e))?;
        self.db
            .put(&mut wtxn, key.as_slice(), value.as_bytes())
            .map_err(|e| self.engine_error(e))?;
        wtxn.commit().map_err(|e| self.engine_error(e))
    }

    /// Delete a record. Returns whether it existed.
    pub fn delete(&self, type_name: &str, qualified_name: &str) -> StoreResult<bool> {
        let key = make_key(type_name, qualified_name);
        let mut wtxn = self.env.write_txn().map_err(|e| self.engine_error(e))?;
        let existed = self
            .db
            .delete(&mut wtxn, key.as_slice())
            .map_err(|e| self.engine_error(e))?;
        wtxn.commit().map_err(|e| self.engine_error(e))?;
        Ok(existed)
    }

    /// Number of entries, from the B-tree statistics.
    pub fn len(&self) -> StoreResult<u64> {
        let rtxn = self.env.read_txn().map_err(|e| self.engine_error(e))?;
        self.db.len(&rtxn).map_err(|e| self.engine_error(e))
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Lazily scan every record key in composite byte order.
    ///
    /// The scan holds one read transaction until the iterator is dropped,
    /// so it sees the store as of this call.
    pub fn keys(&self) -> StoreResult<Keys<'_>> {
        Ok(Keys::new(self.items()?))
    }

    /// Lazily scan every `(key, value)` pair in composite byte order.
    pub fn items(&self) -> StoreResult<Items<'_>> {
        let rtxn = self.env.read_txn().map_err(|e| self.engine_error(e))?;
        Ok(Items::new(self, rtxn))
    }

    /// Flush engine buffers to disk.
    pub fn force_sync(&self) -> StoreResult<()> {
        self.env.force_sync().map_err(|e| self.engine_error(e))
    }

    /// Close the store and wait for the environment to be released.
    pub fn close(self) {
        let path = self.path;
        self.env.prepare_for_closing().wait();
        debug!(target: "checkpoint::store", path = %path.display(), "Closed checkpoint store");
    }

    pub(crate) fn engine_error(&self, err: heed::Error) -> StoreError {
        StoreError::engine(err, self.config.map_size)
    }
}

impl std::fmt::Debug for CheckpointStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckpointStore")
            .field("path", &self.path)
            .field("config", &self.config)
            .finish()
    }
}

/// Decode stored value bytes as UTF-8.
pub(crate) fn decode_value(bytes: &[u8]) -> StoreResult<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| StoreError::Value(ValueError::InvalidUtf8))
}

/// Decode a stored key.
pub(crate) fn decode_key(bytes: &[u8]) -> StoreResult<RecordKey> {
    Ok(RecordKey::decode(bytes)?)
}
