// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The two background loops the event loop owns besides request
//! dispatch (SPEC_FULL §5.1, §4.4): periodic checkpoint compaction, and the
//! session-expiry sweep. Both are idempotent and safe to restart, as §5
//! requires of any background operation.

use std::sync::Arc;
use std::time::Duration;

use jobctl_core::{SystemClock, UuidIdGen};
use jobctl_engine::Engine;
use jobctl_storage::Checkpointer;
use tracing::{debug, error, warn};

/// Checkpoint interval (60s), matching the reference daemon's `Checkpointer`
/// cadence (§5.1).
pub const CHECKPOINT_INTERVAL: Duration = Duration::from_secs(60);

/// Session-expiry sweep interval. Finer-grained than the checkpoint cadence
/// since a stuck launcher should have its lease reclaimed promptly (§4.4).
pub const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Spawn the periodic checkpoint task: clone state under a brief lock,
/// serialize/compress/fsync on a blocking thread, and only then truncate
/// the WAL up to the checkpointed sequence (§5.1's durability ordering).
pub fn spawn_checkpoint_loop(
    engine: Arc<Engine<SystemClock, UuidIdGen>>,
    snapshot_path: std::path::PathBuf,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let checkpointer = Checkpointer::new(snapshot_path);
        let mut interval = tokio::time::interval(CHECKPOINT_INTERVAL);
        loop {
            interval.tick().await;
            run_checkpoint_once(&engine, &checkpointer).await;
        }
    })
}

async fn run_checkpoint_once(engine: &Engine<SystemClock, UuidIdGen>, checkpointer: &Checkpointer) {
    let processed_seq = engine.wal_processed_seq();
    if processed_seq == 0 {
        return;
    }

    let state = engine.clone_state();
    let handle = checkpointer.start(processed_seq, &state);
    let result = tokio::task::spawn_blocking(move || handle.wait()).await;

    match result {
        Ok(Ok(checkpoint_result)) => {
            debug!(seq = checkpoint_result.seq, size_bytes = checkpoint_result.size_bytes, "checkpoint complete");
            if let Err(e) = engine.truncate_wal_before(processed_seq) {
                warn!(error = %e, "failed to truncate WAL after checkpoint");
            }
        }
        Ok(Err(e)) => warn!(error = %e, "checkpoint failed, WAL not truncated"),
        Err(e) => warn!(error = %e, "checkpoint task panicked"),
    }
}

/// Spawn the session-expiry sweep: `jobctl_engine::sessions::sweep_expired`
/// already does the release-and-delete transaction; this loop just calls
/// it on a timer so no launcher crash leaks a lease forever (§4.4).
pub fn spawn_session_sweep_loop(engine: Arc<Engine<SystemClock, UuidIdGen>>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            match jobctl_engine::sessions::sweep_expired(&engine) {
                Ok(expired) if !expired.is_empty() => {
                    debug!(count = expired.len(), "swept expired sessions");
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "session-expiry sweep failed"),
            }
        }
    })
}
