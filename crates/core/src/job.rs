// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job entity, state machine, and the lock-status projection (§3, §4.3).

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{AppId, BatchJobId, JobId, SessionId};
use crate::owned::Owned;
use crate::UserId;

/// A Job's position in the lifecycle (§4.3). Terminal states are marked in
/// their doc comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Created,
    StagedIn,
    AwaitingParents,
    Ready,
    Preprocessed,
    Running,
    Postprocessed,
    RunError,
    RunTimeout,
    RunDone,
    StagedOut,
    /// Terminal.
    JobFinished,
    /// Terminal.
    Failed,
    RestartReady,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::JobFinished | JobState::Failed)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Created => "CREATED",
            JobState::StagedIn => "STAGED_IN",
            JobState::AwaitingParents => "AWAITING_PARENTS",
            JobState::Ready => "READY",
            JobState::Preprocessed => "PREPROCESSED",
            JobState::Running => "RUNNING",
            JobState::Postprocessed => "POSTPROCESSED",
            JobState::RunError => "RUN_ERROR",
            JobState::RunTimeout => "RUN_TIMEOUT",
            JobState::RunDone => "RUN_DONE",
            JobState::StagedOut => "STAGED_OUT",
            JobState::JobFinished => "JOB_FINISHED",
            JobState::Failed => "FAILED",
            JobState::RestartReady => "RESTART_READY",
        };
        write!(f, "{s}")
    }
}

/// Who is initiating a transition. `AWAITING_PARENTS → READY` is engine-only
/// (§4.3); every other accepted transition may originate from a client patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionActor {
    Client,
    Engine,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: JobState,
    pub to: JobState,
}

/// Validate a proposed state transition (§4.3). Returns `Ok(())` when `to` is
/// reachable from `from` for the given actor, else `InvalidTransition`.
pub fn validate_transition(
    from: JobState,
    to: JobState,
    actor: TransitionActor,
) -> Result<(), InvalidTransition> {
    use JobState::*;

    let ok = match (from, to) {
        (Created, StagedIn) => true,
        (StagedIn, Ready) => true,
        (StagedIn, AwaitingParents) => true,
        (AwaitingParents, Ready) => actor == TransitionActor::Engine,
        (Ready, Preprocessed) => true,
        // A child-less job's row never leaves `STAGED_IN` (only its LogEvent
        // records the `-> READY` hop, §4.3), so this is the row-level
        // equivalent of `(Ready, Preprocessed)` for that job.
        (StagedIn, Preprocessed) => true,
        (Preprocessed, Running) => true,
        (Running, Postprocessed) => true,
        (Running, RunError) => true,
        (Running, RunTimeout) => true,
        (Running, RunDone) => true,
        (Postprocessed, StagedOut) => true,
        (RunError, StagedOut) => true,
        (RunTimeout, StagedOut) => true,
        (RunDone, StagedOut) => true,
        (StagedOut, JobFinished) => true,
        (RestartReady, Running) => true,
        // Any non-terminal state may fail or be reset to restart-ready.
        (s, Failed) if !s.is_terminal() => true,
        (s, RestartReady) if !s.is_terminal() => true,
        _ => false,
    };

    if ok {
        Ok(())
    } else {
        Err(InvalidTransition { from, to })
    }
}

/// A human-readable projection of a Job's current state plus whether a
/// Session holds it (§3 "Lock status", glossary). Computed, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockStatus {
    Unlocked,
    Preprocessing,
    AcquiredByLauncher,
    Running,
    StagingOut,
    Locked,
}

impl LockStatus {
    pub fn derive(state: JobState, is_leased: bool) -> LockStatus {
        if !is_leased {
            return LockStatus::Unlocked;
        }
        match state {
            JobState::StagedIn | JobState::Ready => LockStatus::Preprocessing,
            JobState::Preprocessed => LockStatus::AcquiredByLauncher,
            JobState::Running | JobState::RestartReady => LockStatus::Running,
            JobState::Postprocessed
            | JobState::RunError
            | JobState::RunTimeout
            | JobState::RunDone
            | JobState::StagedOut => LockStatus::StagingOut,
            _ => LockStatus::Locked,
        }
    }
}

/// Resource hints a launcher uses for node-resource bin-packing (§4.4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceHints {
    #[serde(default = "default_ranks_per_node")]
    pub ranks_per_node: u32,
    #[serde(default = "default_one")]
    pub threads_per_rank: u32,
    #[serde(default = "default_one")]
    pub node_packing_count: u32,
    #[serde(default)]
    pub wall_time_min: u32,
    #[serde(default)]
    pub gpus_per_rank: u32,
    #[serde(default)]
    pub launch_params: String,
}

fn default_ranks_per_node() -> u32 {
    1
}
fn default_one() -> u32 {
    1
}

impl Default for ResourceHints {
    fn default() -> Self {
        Self {
            ranks_per_node: 1,
            threads_per_rank: 1,
            node_packing_count: 1,
            wall_time_min: 0,
            gpus_per_rank: 0,
            launch_params: String::new(),
        }
    }
}

/// An individual computation instance scheduled against an App (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub owner_id: UserId,
    pub app_ref: AppId,
    /// Relative path, unique per site.
    pub workdir: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub resources: ResourceHints,
    #[serde(default)]
    pub parents: BTreeSet<JobId>,
    pub state: JobState,
    /// Transient on write; not persisted (§4.3, §9). Always empty on read.
    #[serde(default)]
    pub state_message: String,
    /// Transient on write; not persisted (§4.3, §9). Always `None` on read.
    #[serde(default)]
    pub state_timestamp: Option<DateTime<Utc>>,
    pub last_update: DateTime<Utc>,
    pub batch_job_ref: Option<BatchJobId>,
    pub session_ref: Option<SessionId>,
    pub return_code: Option<i32>,
    /// True when `batch_job_ref` was set implicitly by `acquire` (§4.4 rule
    /// 5) rather than by an explicit client patch — only these bindings are
    /// cleared on session release/expiry.
    #[serde(default)]
    pub batch_job_bound_by_session: bool,
    /// Opaque client payload carried on bulk_update's `data` field.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Job {
    pub fn lock_status(&self) -> LockStatus {
        LockStatus::derive(self.state, self.session_ref.is_some())
    }

    pub fn is_leased(&self) -> bool {
        self.session_ref.is_some()
    }
}

impl Owned for Job {
    fn owner_id(&self) -> &UserId {
        &self.owner_id
    }
}
