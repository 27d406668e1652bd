//! Single-writer lock on the status page.
//!
//! Uses flock-style advisory locking so that two monitors never write the
//! same output.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Holds an exclusive lock until dropped.
pub struct LockGuard {
    _file: File,
    path: PathBuf,
}

impl LockGuard {
    /// Attempt to acquire an exclusive lock on `lock_path`.
    /// Returns an error if another monitor already holds it.
    ///
    /// Opens with create+read+write (no truncate) to avoid a race between
    /// file creation and lock acquisition.
    pub fn acquire(lock_path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)
            .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;

        file.try_lock_exclusive().map_err(|_| {
            anyhow::anyhow!(
                "Another gatewatch instance is already writing this output.\n\
                 Lock file: {}",
                lock_path.display()
            )
        })?;

        Ok(Self {
            _file: file,
            path: lock_path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// Lock is released when the file is closed (on drop)
