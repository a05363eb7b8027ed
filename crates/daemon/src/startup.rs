// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process startup: load the most recent snapshot (if any), open the WAL
//! positioned just past the snapshotted sequence, replay whatever events
//! postdate it into `MaterializedState`, and hand back a ready `Engine`
//! (SPEC_FULL §5.1, mirroring the reference daemon's `lifecycle::startup`
//! snapshot-then-replay recovery path).

use jobctl_core::{SystemClock, UuidIdGen};
use jobctl_engine::Engine;
use jobctl_storage::{load_snapshot, MaterializedState, Wal};
use tracing::info;

use crate::config::Config;
use crate::error::DaemonError;
use crate::lock::InstanceLock;

/// Acquire the single-instance lock and build the engine from durable
/// state. The returned `InstanceLock` must be held for the process
/// lifetime — dropping it releases the lock and lets a subsequent start
/// proceed.
pub fn start(config: &Config) -> Result<(InstanceLock, Engine<SystemClock, UuidIdGen>), DaemonError> {
    let lock = InstanceLock::acquire(&config.lock_path)?;
    let engine = build_engine(config)?;
    Ok((lock, engine))
}

/// Build a fresh `Engine` from whatever durable state exists under
/// `config.state_dir`: an empty `MaterializedState` on first start, or a
/// snapshot-plus-WAL-tail replay on every subsequent one. Does not touch
/// the single-instance lock; use `start` for the full process-startup path.
pub fn build_engine(config: &Config) -> Result<Engine<SystemClock, UuidIdGen>, DaemonError> {
    let (mut state, snapshot_seq) = match load_snapshot(&config.snapshot_path)? {
        Some(snapshot) => {
            info!(seq = snapshot.seq, "loaded snapshot");
            (snapshot.state, snapshot.seq)
        }
        None => (MaterializedState::default(), 0),
    };

    let mut wal = Wal::open(&config.wal_path, snapshot_seq)?;
    let mut replayed = 0u64;
    while let Some(entry) = wal.next_unprocessed()? {
        state.apply_event(&entry.event);
        wal.mark_processed(entry.seq);
        replayed += 1;
    }
    if replayed > 0 {
        info!(replayed, "replayed WAL tail past snapshot");
    }

    Ok(Engine::new(
        state,
        wal,
        SystemClock,
        UuidIdGen,
        config.engine.clone(),
    ))
}
