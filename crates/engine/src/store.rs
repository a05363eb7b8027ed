// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Engine`: the `Arc<parking_lot::Mutex<MaterializedState>>`-guarded
//! transactional core (§5.1). `commit` is the single choke point every
//! mutating service method funnels through — it holds the state mutex for
//! the full duration of candidate selection plus the write that realizes
//! it, which is how "two concurrent acquires never return the same job"
//! (§4.4, §5) is satisfied without a database row lock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use jobctl_core::{Clock, Event, IdGen, SystemClock, UuidIdGen};
use jobctl_storage::MaterializedState;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::notifier::Notifier;

pub struct Engine<C = SystemClock, G = UuidIdGen>
where
    C: Clock,
    G: IdGen,
{
    state: Arc<Mutex<MaterializedState>>,
    wal: Mutex<jobctl_storage::Wal>,
    clock: C,
    id_gen: G,
    pub notifier: Notifier,
    pub config: EngineConfig,
}

impl<C, G> Engine<C, G>
where
    C: Clock,
    G: IdGen,
{
    pub fn new(
        initial_state: MaterializedState,
        wal: jobctl_storage::Wal,
        clock: C,
        id_gen: G,
        config: EngineConfig,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(initial_state)),
            wal: Mutex::new(wal),
            clock,
            id_gen,
            notifier: Notifier::new(),
            config,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// A freshly generated `{prefix}-{token}` id (§3.1).
    pub fn new_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.id_gen.next())
    }

    /// Read-only access to the materialized state, e.g. for query-layer
    /// list/get/count calls.
    pub fn with_state<T>(&self, f: impl FnOnce(&MaterializedState) -> T) -> T {
        let guard = self.state.lock();
        f(&guard)
    }

    /// A shared handle to the state, for components (the session-expiry
    /// sweeper) that need to drive their own `commit` cycles from outside
    /// a single service method.
    pub fn state_handle(&self) -> Arc<Mutex<MaterializedState>> {
        Arc::clone(&self.state)
    }

    /// A point-in-time clone of the state, for the checkpoint task: the
    /// clone happens under a brief lock, the expensive serialize/compress
    /// work runs outside it (§5.1).
    pub fn clone_state(&self) -> MaterializedState {
        self.state.lock().clone()
    }

    /// The highest WAL sequence number applied to `MaterializedState` so
    /// far, the watermark a checkpoint is taken at.
    pub fn wal_processed_seq(&self) -> u64 {
        self.wal.lock().processed_seq()
    }

    /// Truncate the WAL up to (not including) `seq`, once a snapshot at
    /// that sequence is durable on disk.
    pub fn truncate_wal_before(&self, seq: u64) -> Result<(), EngineError> {
        self.wal.lock().truncate_before(seq).map_err(EngineError::from)
    }

    /// Run one transaction: `f` observes the current state and returns the
    /// events it decided to emit (computed as pure data, not yet applied —
    /// §5.1's "events are facts" discipline) alongside whatever the caller
    /// wants back. Events are appended to the WAL, flushed, and only then
    /// applied to `MaterializedState` — all while holding the single state
    /// mutex, so no other `commit` can interleave.
    pub fn commit<R>(
        &self,
        f: impl FnOnce(&MaterializedState) -> Result<(R, Vec<Event>), EngineError>,
    ) -> Result<R, EngineError> {
        let mut state = self.state.lock();
        let (result, events) = f(&state)?;

        if !events.is_empty() {
            let mut wal = self.wal.lock();
            let mut last_seq = 0;
            for event in &events {
                last_seq = wal.append(event)?;
            }
            if let Err(e) = wal.flush() {
                warn!(error = %e, events = events.len(), "WAL flush failed, transaction not durable");
                return Err(e.into());
            }
            wal.mark_processed(last_seq);
            debug!(count = events.len(), last_seq, "committed transaction");
        }

        for event in &events {
            state.apply_event(event);
        }

        Ok(result)
    }
}

#[cfg(test)]
pub(crate) fn test_engine() -> Engine<jobctl_core::FakeClock, jobctl_core::SequentialIdGen> {
    let dir = tempfile::tempdir().expect("tempdir");
    let wal_path = dir.path().join("events.wal");
    let wal = jobctl_storage::Wal::open(&wal_path, 0).expect("open wal");
    // Leak the tempdir so the WAL file outlives the test engine; each test
    // gets its own directory so this does not accumulate across a run.
    std::mem::forget(dir);
    Engine::new(
        MaterializedState::default(),
        wal,
        jobctl_core::FakeClock::new("2026-01-01T00:00:00Z".parse().expect("valid literal timestamp")),
        jobctl_core::SequentialIdGen::new("t"),
        EngineConfig::default(),
    )
}
