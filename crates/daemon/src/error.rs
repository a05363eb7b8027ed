// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wiring errors: config resolution, durability-layer recovery,
//! and the housekeeping I/O the reference daemon's `LifecycleError` covers.

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("WAL error: {0}")]
    Wal(#[from] jobctl_storage::WalError),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] jobctl_storage::SnapshotError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Another process already holds `config.lock_path` (§5.1: a second
    /// daemon against the same state directory must refuse to start rather
    /// than race the first one's WAL).
    #[error("another jobctl-daemon already holds the lock at {0:?}")]
    AlreadyRunning(std::path::PathBuf),
}
