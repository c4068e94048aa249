//! Per-target serialization of mutating operations.
//!
//! The marker files and staged tarballs are shared mutable state on local
//! disk with no transactional story, so two concurrent stages (or an
//! apply reading a marker mid-write) must not interleave. [`UpdateLock`]
//! is an OS-level exclusive file lock in `state_dir/locks/`, one per
//! target, taken by every mutating operation (stage, apply, upgrade,
//! rollback). Checks are read-only and do not take it.
//!
//! The lock is advisory and in-host only; the orchestrator is a
//! single-host design and needs nothing stronger.

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Which shared state a mutation is about to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTarget {
    /// The bot's CLI-driven update state.
    Bot,
    /// The panel's staged artifact and markers.
    Panel,
}

impl LockTarget {
    /// Lock file stem for this target.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bot => "bot",
            Self::Panel => "panel",
        }
    }
}

/// Held exclusive lock for one target; released on drop.
pub struct UpdateLock {
    _file: File,
    path: PathBuf,
}

impl UpdateLock {
    /// Acquire the exclusive lock for `target`, blocking until the current
    /// holder (if any) releases it.
    ///
    /// The blocking lock call runs on the blocking pool so it cannot stall
    /// the async runtime.
    pub async fn acquire(state_dir: &Path, target: LockTarget) -> Result<Self> {
        let locks_dir = state_dir.join("locks");
        tokio::fs::create_dir_all(&locks_dir)
            .await
            .with_context(|| format!("Failed to create locks directory: {}", locks_dir.display()))?;

        let path = locks_dir.join(format!("{}.lock", target.as_str()));
        let lock_path = path.clone();
        let file = tokio::task::spawn_blocking(move || -> Result<File> {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&lock_path)
                .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;
            file.lock_exclusive()
                .with_context(|| format!("Failed to lock {}", lock_path.display()))?;
            Ok(file)
        })
        .await
        .context("Lock acquisition task failed")??;

        debug!(target: "lock", "acquired {} lock at {}", target.as_str(), path.display());
        Ok(Self { _file: file, path })
    }
}

impl Drop for UpdateLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self._file) {
            debug!(target: "lock", "failed to unlock {}: {err}", self.path.display());
        }
    }
}
