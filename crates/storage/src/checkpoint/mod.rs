//! Checkpoint lifecycle
//!
//! Filesystem operations that bracket a whole diff run:
//!
//! ```text
//! copy_checkpoint(live, working)     working copy, live untouched
//!   ... run mutates working ...
//! swap_checkpoints(working, live)    commit point (rename)
//!   or
//! cleanup_incomplete_checkpoint(working)
//! ```
//!
//! These add no transactionality beyond `rename` atomicity, which only
//! holds within one filesystem. [`CheckpointPaths`] keeps the working copy
//! next to the live checkpoint so the rename never crosses a volume.
//!
//! Pre-existing targets are removed without any check: the last writer
//! wins. Callers own a checkpoint directory exclusively.
//!
//! No store may be open on a directory while it is copied, swapped or
//! removed. Close it first.

mod paths;

pub use paths::{CheckpointPaths, DATA_FILE, LOCK_FILE, WORKING_SUFFIX};

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// Lifecycle operation errors
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// Creating the working copy failed
    #[error("Failed to copy checkpoint {} to {}: {source}", .source_dir.display(), .target.display())]
    Copy {
        /// Checkpoint being copied
        source_dir: PathBuf,
        /// Destination directory
        target: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Swapping the working copy into place failed
    #[error("Failed to swap checkpoint {} into {}: {source}", .new.display(), .target.display())]
    Swap {
        /// Working copy being promoted
        new: PathBuf,
        /// Live checkpoint location
        target: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Removing a directory failed
    #[error("Failed to remove checkpoint {}: {source}", .path.display())]
    Remove {
        /// Directory being removed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Measuring the checkpoint size failed
    #[error("Failed to read checkpoint {}: {source}", .path.display())]
    Read {
        /// Directory being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

impl LifecycleError {
    /// Whether the underlying I/O error is a full disk
    pub fn is_disk_full(&self) -> bool {
        let source = match self {
            LifecycleError::Copy { source, .. }
            | LifecycleError::Swap { source, .. }
            | LifecycleError::Remove { source, .. }
            | LifecycleError::Read { source, .. } => source,
        };
        source.raw_os_error() == Some(28) // ENOSPC
    }
}

/// Whether `dir` holds a checkpoint (its data file exists).
pub fn checkpoint_exists(dir: impl AsRef<Path>) -> bool {
    dir.as_ref().join(DATA_FILE).is_file()
}

/// Replace `target` with a recursive copy of `source`.
///
/// Debris left at `target` by an earlier failed run is removed first.
pub fn copy_checkpoint(
    source: impl AsRef<Path>,
    target: impl AsRef<Path>,
) -> Result<(), LifecycleError> {
    let (source, target) = (source.as_ref(), target.as_ref());
    let wrap = |e: io::Error| LifecycleError::Copy {
        source_dir: source.to_path_buf(),
        target: target.to_path_buf(),
        source: e,
    };

    remove_dir_if_exists(target).map_err(wrap)?;
    copy_dir_recursive(source, target).map_err(wrap)?;

    info!(
        target: "checkpoint::lifecycle",
        source = %source.display(),
        target = %target.display(),
        "Copied checkpoint"
    );
    Ok(())
}

/// Promote `new` to `target`.
///
/// Removes `target` if present, renames `new` onto it, then syncs the
/// parent directory so the rename survives a crash. Once this returns,
/// `target` is the checkpoint.
///
/// An error means the rename did not happen. A failed directory sync after
/// the rename is logged at `warn` and not returned.
pub fn swap_checkpoints(
    new: impl AsRef<Path>,
    target: impl AsRef<Path>,
) -> Result<(), LifecycleError> {
    let (new, target) = (new.as_ref(), target.as_ref());
    let wrap = |e: io::Error| LifecycleError::Swap {
        new: new.to_path_buf(),
        target: target.to_path_buf(),
        source: e,
    };

    remove_dir_if_exists(target).map_err(wrap)?;
    rename_then_sync(new, target, sync_parent_dir).map_err(wrap)?;

    info!(
        target: "checkpoint::lifecycle",
        new = %new.display(),
        target = %target.display(),
        "Swapped checkpoint into place"
    );
    Ok(())
}

/// Remove a working copy left by a failed run. A missing directory is fine.
pub fn cleanup_incomplete_checkpoint(dir: impl AsRef<Path>) -> Result<(), LifecycleError> {
    let dir = dir.as_ref();
    remove_dir_if_exists(dir).map_err(|source| LifecycleError::Remove {
        path: dir.to_path_buf(),
        source,
    })
}

/// Total on-disk size of a checkpoint directory in bytes.
///
/// LMDB files are sparse, so this is the apparent size, which can exceed
/// the blocks actually allocated.
pub fn checkpoint_size(dir: impl AsRef<Path>) -> Result<u64, LifecycleError> {
    let dir = dir.as_ref();
    dir_size(dir).map_err(|source| LifecycleError::Read {
        path: dir.to_path_buf(),
        source,
    })
}

fn remove_dir_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Rename, then sync. The rename is the commit point, so a sync failure
/// after it is only logged.
fn rename_then_sync(
    new: &Path,
    target: &Path,
    sync: impl FnOnce(&Path) -> io::Result<()>,
) -> io::Result<()> {
    fs::rename(new, target)?;
    if let Err(e) = sync(target) {
        warn!(
            target: "checkpoint::lifecycle",
            target = %target.display(),
            error = %e,
            "Checkpoint renamed but parent directory sync failed"
        );
    }
    Ok(())
}

/// Copy a checkpoint tree. The top-level lock file only holds the reader
/// table of a live environment and is rebuilt on open, so it is skipped.
fn copy_dir_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    let mut pending = vec![(src.to_path_buf(), dst.to_path_buf())];

    while let Some((from, to)) = pending.pop() {
        fs::create_dir_all(&to)?;
        for entry in fs::read_dir(&from)? {
            let entry = entry?;
            let name = entry.file_name();
            if from.as_path() == src && name == LOCK_FILE {
                continue;
            }
            if entry.file_type()?.is_dir() {
                pending.push((entry.path(), to.join(&name)));
            } else {
                fs::copy(entry.path(), to.join(&name))?;
            }
        }
    }
    Ok(())
}

/// Apparent size of every regular file under `root`. Symlinks are not followed.
fn dir_size(root: &Path) -> io::Result<u64> {
    let mut dirs = vec![root.to_path_buf()];
    let mut bytes = 0;

    while let Some(dir) = dirs.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                dirs.push(entry.path());
            } else if file_type.is_file() {
                bytes += entry.metadata()?.len();
            }
        }
    }
    Ok(bytes)
}

fn sync_parent_dir(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if parent.exists() {
            File::open(parent)?.sync_all()?;
        }
    }
    Ok(())
}
