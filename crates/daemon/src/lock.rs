// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-instance advisory lock over `config.lock_path` (SPEC_FULL §5.1),
//! mirroring the reference daemon's `lifecycle::startup` lock acquisition:
//! a second process pointed at the same state directory must refuse to
//! start rather than open a second WAL writer against it.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::DaemonError;

/// Holds the advisory lock on `lock_path` for the process lifetime. The OS
/// releases the lock automatically if the process dies without dropping
/// this guard, so a stale pid file left behind by a crash never wedges the
/// next start.
pub struct InstanceLock {
    path: PathBuf,
    file: File,
}

impl InstanceLock {
    /// Acquire the lock, writing this process's pid into the file once held.
    /// Uses `try_lock_exclusive` (non-blocking) rather than `lock_exclusive`:
    /// a launcher waiting on a stuck daemon should fail fast, not hang.
    pub fn acquire(lock_path: &Path) -> Result<Self, DaemonError> {
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)?;
        file.try_lock_exclusive()
            .map_err(|_| DaemonError::AlreadyRunning(lock_path.to_path_buf()))?;

        file.set_len(0)?;
        let mut file = file;
        writeln!(file, "{}", std::process::id())?;

        Ok(InstanceLock {
            path: lock_path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        // Dropping `self.file` closes the fd, which releases the OS
        // advisory lock; only the pid file itself needs explicit cleanup.
        let _ = std::fs::remove_file(&self.path);
    }
}
