// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! BatchJob entity and the frozen-field computation behind the revert
//! protocol (§4.5).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{BatchJobId, SiteId};
use crate::owned::Owned;
use crate::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchJobState {
    PendingSubmission,
    Queued,
    Running,
    Finished,
    Failed,
    PendingDeletion,
}

impl BatchJobState {
    /// Once a BatchJob reaches one of these states, `wall_time_min`,
    /// `num_nodes`, `project`, `queue`, `job_mode` are frozen (§4.5,
    /// decided at `queued` onward per SPEC_FULL §9 Open Question 2).
    pub fn freezes_scheduling_fields(self) -> bool {
        matches!(
            self,
            BatchJobState::Queued
                | BatchJobState::Running
                | BatchJobState::Finished
                | BatchJobState::Failed
        )
    }
}

/// A scheduler allocation request submitted to a Site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJob {
    pub id: BatchJobId,
    pub owner_id: UserId,
    pub site_ref: SiteId,
    pub project: String,
    pub queue: String,
    pub num_nodes: u32,
    pub wall_time_min: u32,
    pub job_mode: String,
    #[serde(default)]
    pub filter_tags: BTreeMap<String, String>,
    pub scheduler_id: Option<i64>,
    pub state: BatchJobState,
    pub status_info: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Transient client-set flag; always `false` on read (§3, §4.5).
    #[serde(default)]
    pub revert: bool,
}

impl Owned for BatchJob {
    fn owner_id(&self) -> &UserId {
        &self.owner_id
    }
}

/// The subset of BatchJob fields a client patch may propose that are subject
/// to the freeze rule (§4.5). `None` means "leave unchanged".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrozenFieldsPatch {
    pub project: Option<String>,
    pub queue: Option<String>,
    pub num_nodes: Option<u32>,
    pub wall_time_min: Option<u32>,
    pub job_mode: Option<String>,
}

impl FrozenFieldsPatch {
    pub fn is_empty(&self) -> bool {
        self.project.is_none()
            && self.queue.is_none()
            && self.num_nodes.is_none()
            && self.wall_time_min.is_none()
            && self.job_mode.is_none()
    }

    /// True if any proposed field differs from the BatchJob's current
    /// stored value (a no-op patch on a frozen field is not a conflict).
    fn drifts_from(&self, current: &BatchJob) -> bool {
        self.project.as_ref().is_some_and(|v| *v != current.project)
            || self.queue.as_ref().is_some_and(|v| *v != current.queue)
            || self.num_nodes.is_some_and(|v| v != current.num_nodes)
            || self.wall_time_min.is_some_and(|v| v != current.wall_time_min)
            || self.job_mode.as_ref().is_some_and(|v| *v != current.job_mode)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("frozen field write without revert on batch job in state {state:?}")]
pub struct FrozenFieldConflict {
    pub state: BatchJobState,
}

impl BatchJob {
    /// Apply a client-proposed patch to the five scheduling fields, honoring
    /// the revert protocol (§4.5).
    ///
    /// - Not frozen (state has not reached `queued`): proposed values apply directly.
    /// - Frozen, `revert == false`, and the patch drifts from stored values: `Conflict`.
    /// - Frozen, `revert == false`, no drift: the (no-op) patch applies.
    /// - Frozen, `revert == true`: the proposed values are ignored; the server's
    ///   stored values are re-asserted (a no-op on the fields) and `revert` is cleared.
    pub fn apply_frozen_fields_patch(
        &mut self,
        patch: &FrozenFieldsPatch,
        revert: bool,
    ) -> Result<(), FrozenFieldConflict> {
        if !self.state.freezes_scheduling_fields() {
            self.set_fields(patch);
            return Ok(());
        }

        if revert {
            // The server's stored value wins; proposed values are discarded.
            self.revert = false;
            return Ok(());
        }

        if patch.drifts_from(self) {
            return Err(FrozenFieldConflict { state: self.state });
        }

        self.set_fields(patch);
        Ok(())
    }

    fn set_fields(&mut self, patch: &FrozenFieldsPatch) {
        if let Some(v) = &patch.project {
            self.project = v.clone();
        }
        if let Some(v) = &patch.queue {
            self.queue = v.clone();
        }
        if let Some(v) = patch.num_nodes {
            self.num_nodes = v;
        }
        if let Some(v) = patch.wall_time_min {
            self.wall_time_min = v;
        }
        if let Some(v) = &patch.job_mode {
            self.job_mode = v.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_job(state: BatchJobState) -> BatchJob {
        BatchJob {
            id: BatchJobId::new("bj-1"),
            owner_id: UserId::new("u1"),
            site_ref: SiteId::new("site-1"),
            project: "proj".into(),
            queue: "default".into(),
            num_nodes: 4,
            wall_time_min: 60,
            job_mode: "script".into(),
            filter_tags: BTreeMap::new(),
            scheduler_id: None,
            state,
            status_info: String::new(),
            start_time: None,
            end_time: None,
            revert: false,
        }
    }

    #[test]
    fn pending_submission_is_fully_mutable() {
        let mut bj = batch_job(BatchJobState::PendingSubmission);
        let patch = FrozenFieldsPatch {
            wall_time_min: Some(90),
            ..Default::default()
        };
        bj.apply_frozen_fields_patch(&patch, false).expect("not yet frozen");
        assert_eq!(bj.wall_time_min, 90);
    }

    #[test]
    fn queued_freezes_and_rejects_drifting_patch_without_revert() {
        let mut bj = batch_job(BatchJobState::Queued);
        let patch = FrozenFieldsPatch {
            wall_time_min: Some(30),
            ..Default::default()
        };
        let err = bj.apply_frozen_fields_patch(&patch, false).unwrap_err();
        assert_eq!(err.state, BatchJobState::Queued);
        assert_eq!(bj.wall_time_min, 60, "rejected patch must not persist");
    }

    #[test]
    fn scenario_s4_revert_commits_server_value_and_clears_flag() {
        let mut bj = batch_job(BatchJobState::Running);
        bj.wall_time_min = 45; // drifted while queued, before running per S4
        let patch = FrozenFieldsPatch {
            wall_time_min: Some(30),
            ..Default::default()
        };
        assert!(bj.apply_frozen_fields_patch(&patch, false).is_err());
        bj.apply_frozen_fields_patch(&patch, true).expect("revert always succeeds");
        assert_eq!(bj.wall_time_min, 45, "server value wins, proposal discarded");
        assert!(!bj.revert);
    }

    #[test]
    fn non_drifting_patch_on_frozen_job_is_not_a_conflict() {
        let mut bj = batch_job(BatchJobState::Queued);
        let patch = FrozenFieldsPatch {
            wall_time_min: Some(60),
            ..Default::default()
        };
        bj.apply_frozen_fields_patch(&patch, false).expect("identical value is not drift");
    }
}
