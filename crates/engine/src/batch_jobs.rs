// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! BatchJob reconciler (§4.5): create/update/delete plus the revert
//! protocol, reusing [`jobctl_core::BatchJob::apply_frozen_fields_patch`].

use chrono::{DateTime, Utc};
use jobctl_core::{
    BatchJob, BatchJobId, BatchJobState, Clock, Event, FrozenFieldsPatch, IdGen, SiteId, UserId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::notifier::{Action, Entity, Notification};
use crate::store::Engine;

/// `POST /batch-jobs/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJobCreateSpec {
    pub site_ref: SiteId,
    pub project: String,
    pub queue: String,
    pub num_nodes: u32,
    pub wall_time_min: u32,
    pub job_mode: String,
    pub filter_tags: BTreeMap<String, String>,
}

/// Writable fields of `PATCH /batch-jobs/{id}` (§4.2, §4.5). Scheduler-
/// authoritative fields apply unconditionally; the five scheduling fields
/// go through the freeze/revert protocol.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchJobPatch {
    pub frozen: FrozenFieldsPatch,
    pub revert: bool,
    pub state: Option<BatchJobState>,
    pub scheduler_id: Option<i64>,
    pub status_info: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

pub fn create<C: Clock, G: IdGen>(
    engine: &Engine<C, G>,
    owner_id: &UserId,
    spec: BatchJobCreateSpec,
) -> Result<BatchJob, EngineError> {
    let batch_job = engine.commit(|state| {
        state
            .get_site(spec.site_ref.as_str())
            .filter(|s| s.owner_id == *owner_id)
            .ok_or(EngineError::NotFound)?;

        let batch_job = BatchJob {
            id: BatchJobId::new(engine.new_id("bj")),
            owner_id: owner_id.clone(),
            site_ref: spec.site_ref,
            project: spec.project,
            queue: spec.queue,
            num_nodes: spec.num_nodes,
            wall_time_min: spec.wall_time_min,
            job_mode: spec.job_mode,
            filter_tags: spec.filter_tags,
            scheduler_id: None,
            state: BatchJobState::PendingSubmission,
            status_info: String::new(),
            start_time: None,
            end_time: None,
            revert: false,
        };

        Ok((
            batch_job.clone(),
            vec![Event::BatchJobCreated { batch_job: batch_job.clone() }],
        ))
    })?;

    engine.notifier.publish(Notification {
        owner_id: owner_id.clone(),
        action: Action::BulkCreate,
        entity: Entity::BatchJob,
        ids: vec![batch_job.id.as_str().to_string()],
    });

    Ok(batch_job)
}

/// `PUT /batch-jobs/{id}`: apply `patch`, honoring the revert protocol on
/// the frozen scheduling fields (§4.5). Returns `EngineError::Conflict` on
/// a drifting write to a frozen field without `revert`.
pub fn update<C: Clock, G: IdGen>(
    engine: &Engine<C, G>,
    owner_id: &UserId,
    id: &BatchJobId,
    patch: BatchJobPatch,
) -> Result<BatchJob, EngineError> {
    let batch_job = engine.commit(|state| {
        let mut batch_job = state
            .get_batch_job(id.as_str())
            .filter(|bj| bj.owner_id == *owner_id)
            .cloned()
            .ok_or(EngineError::NotFound)?;

        batch_job
            .apply_frozen_fields_patch(&patch.frozen, patch.revert)
            .map_err(|e| EngineError::Conflict(e.to_string()))?;

        if let Some(v) = patch.state {
            batch_job.state = v;
        }
        if let Some(v) = patch.scheduler_id {
            batch_job.scheduler_id = Some(v);
        }
        if let Some(v) = patch.status_info {
            batch_job.status_info = v;
        }
        if let Some(v) = patch.start_time {
            batch_job.start_time = Some(v);
        }
        if let Some(v) = patch.end_time {
            batch_job.end_time = Some(v);
        }

        Ok((
            batch_job.clone(),
            vec![Event::BatchJobReplaced { batch_job: batch_job.clone() }],
        ))
    })?;

    engine.notifier.publish(Notification {
        owner_id: owner_id.clone(),
        action: Action::BulkUpdate,
        entity: Entity::BatchJob,
        ids: vec![batch_job.id.as_str().to_string()],
    });

    Ok(batch_job)
}

/// `DELETE /batch-jobs/{id}`: the only delete shape permitted (§4.5,
/// testable property: filter-driven delete is `NotImplemented`).
pub fn delete<C: Clock, G: IdGen>(engine: &Engine<C, G>, owner_id: &UserId, id: &BatchJobId) -> Result<(), EngineError> {
    engine.commit(|state| {
        state
            .get_batch_job(id.as_str())
            .filter(|bj| bj.owner_id == *owner_id)
            .ok_or(EngineError::NotFound)?;
        Ok(((), vec![Event::BatchJobDeleted { id: id.clone() }]))
    })?;

    engine.notifier.publish(Notification {
        owner_id: owner_id.clone(),
        action: Action::BulkDelete,
        entity: Entity::BatchJob,
        ids: vec![id.as_str().to_string()],
    });

    Ok(())
}

/// `DELETE /batch-jobs/` (collection route): always rejected (§4.5, §7).
/// BatchJobs are deletable only per-row; a filter-driven bulk delete has
/// no implementation.
pub fn delete_by_query<C: Clock, G: IdGen>(_engine: &Engine<C, G>) -> Result<(), EngineError> {
    Err(EngineError::NotImplemented(
        "BatchJob collection delete is not supported; delete by id".into(),
    ))
}
