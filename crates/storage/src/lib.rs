// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable storage: a group-commit WAL of [`jobctl_core::Event`]s, the
//! [`MaterializedState`] it replays into, and background zstd-compressed
//! checkpointing (§5.1).

mod checkpoint;
mod migration;
mod snapshot;
mod state;
mod wal;

/// Current on-disk snapshot schema version. Bump and add a [`migration::Migration`]
/// when [`MaterializedState`]'s shape changes in a way old snapshots can't parse as-is.
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

pub use checkpoint::{
    load_snapshot, CheckpointError, CheckpointHandle, CheckpointResult, CheckpointWriter,
    Checkpointer, FsCheckpointWriter,
};
pub use migration::{Migration, MigrationError, MigrationRegistry};
pub use snapshot::{Snapshot, SnapshotError};
pub use state::MaterializedState;
pub use wal::{Wal, WalEntry, WalError};
