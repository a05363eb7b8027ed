// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job state machine & bulk mutation service (§4.2, §4.3).

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use jobctl_core::{
    validate_transition, BatchJobId, Clock, Event, IdGen, Job, JobId, JobState, LogEvent,
    LogEventId, ResourceHints, TransferDirection, TransferItem, TransferItemId, TransferState,
    TransitionActor, UserId,
};
use jobctl_query::jobs::JobFilter;
use jobctl_storage::MaterializedState;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::notifier::{Action, Entity, Notification};
use crate::store::Engine;

/// Request body for one job in `bulk_create` (§6, POST /jobs/).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobCreateSpec {
    pub app_ref: jobctl_core::AppId,
    pub workdir: String,
    pub parameters: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
    pub resources: ResourceHints,
    pub parents: BTreeSet<JobId>,
    pub data: serde_json::Value,
    pub transfer_items: Vec<TransferItemSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferItemSpec {
    pub direction: TransferDirection,
    pub location_alias: String,
    pub remote_path: String,
    pub local_path: String,
}

/// Only these fields are honored by `bulk_update`/`update_by_query` (§4.2).
/// `batch_job_ref` uses the standard nested-option convention: `None` means
/// "leave unchanged", `Some(None)` clears it, `Some(Some(id))` sets it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobPatch {
    pub workdir: Option<String>,
    pub tags: Option<BTreeMap<String, String>>,
    pub parameters: Option<BTreeMap<String, String>>,
    pub ranks_per_node: Option<u32>,
    pub threads_per_rank: Option<u32>,
    pub node_packing_count: Option<u32>,
    pub wall_time_min: Option<u32>,
    pub gpus_per_rank: Option<u32>,
    pub launch_params: Option<String>,
    pub state: Option<JobState>,
    pub state_message: Option<String>,
    pub state_timestamp: Option<DateTime<Utc>>,
    pub return_code: Option<i32>,
    pub parents: Option<BTreeSet<JobId>>,
    pub batch_job_ref: Option<Option<BatchJobId>>,
    pub data: Option<serde_json::Value>,
}

fn apply_field_patch(job: &mut Job, patch: &JobPatch) {
    if let Some(v) = &patch.workdir {
        job.workdir = v.clone();
    }
    if let Some(v) = &patch.tags {
        job.tags = v.clone();
    }
    if let Some(v) = &patch.parameters {
        job.parameters = v.clone();
    }
    if let Some(v) = patch.ranks_per_node {
        job.resources.ranks_per_node = v;
    }
    if let Some(v) = patch.threads_per_rank {
        job.resources.threads_per_rank = v;
    }
    if let Some(v) = patch.node_packing_count {
        job.resources.node_packing_count = v;
    }
    if let Some(v) = patch.wall_time_min {
        job.resources.wall_time_min = v;
    }
    if let Some(v) = patch.gpus_per_rank {
        job.resources.gpus_per_rank = v;
    }
    if let Some(v) = &patch.launch_params {
        job.resources.launch_params = v.clone();
    }
    if let Some(v) = &patch.parents {
        job.parents = v.clone();
    }
    if let Some(v) = &patch.batch_job_ref {
        job.batch_job_ref = v.clone();
        job.batch_job_bound_by_session = false;
    }
    if let Some(v) = patch.return_code {
        job.return_code = Some(v);
    }
    if let Some(v) = &patch.data {
        job.data = v.clone();
    }
    // state_message/state_timestamp are never persisted on the Job row
    // (§4.3, §9) regardless of what the patch proposed; the LogEvent
    // produced alongside a state change is the only durable record.
    job.state_message = String::new();
    job.state_timestamp = None;
}

fn new_log_event<G: IdGen>(id_gen: &G, job_ref: &JobId, from: Option<JobState>, to: JobState, now: DateTime<Utc>, message: String) -> LogEvent {
    LogEvent {
        id: LogEventId::new(id_gen.next()),
        job_ref: job_ref.clone(),
        timestamp: now,
        from_state: from,
        to_state: to,
        message,
    }
}

/// Recompute child readiness (§4.3): every child of a job that just reached
/// `JOB_FINISHED` moves `AWAITING_PARENTS -> READY` once *all* of its
/// parents are finished, resolving sibling transitions from the same batch
/// via `updated` before falling back to `state`.
fn recompute_child_readiness(
    state: &MaterializedState,
    owner_id: &UserId,
    updated: &mut HashMap<String, Job>,
    log_events: &mut Vec<LogEvent>,
    id_gen: &impl IdGen,
    now: DateTime<Utc>,
) {
    let effective = |id: &str, updated: &HashMap<String, Job>| -> Option<Job> {
        updated.get(id).cloned().or_else(|| state.get_job(id).cloned())
    };

    let newly_finished: Vec<JobId> = updated
        .values()
        .filter(|j| j.state == JobState::JobFinished)
        .map(|j| j.id.clone())
        .collect();
    if newly_finished.is_empty() {
        return;
    }

    let all_job_ids: Vec<String> = state
        .jobs
        .values()
        .filter(|j| &j.owner_id == owner_id)
        .map(|j| j.id.as_str().to_string())
        .chain(updated.keys().cloned())
        .collect();

    for job_id in all_job_ids {
        let mut child = match effective(&job_id, updated) {
            Some(j) if j.owner_id == *owner_id => j,
            _ => continue,
        };
        if child.state != JobState::AwaitingParents {
            continue;
        }
        if !child.parents.iter().any(|p| newly_finished.contains(p)) {
            continue;
        }
        let all_finished = child.parents.iter().all(|p| {
            effective(p.as_str(), updated)
                .map(|parent| parent.state == JobState::JobFinished)
                .unwrap_or(false)
        });
        if !all_finished {
            continue;
        }
        log_events.push(new_log_event(
            id_gen,
            &child.id,
            Some(JobState::AwaitingParents),
            JobState::Ready,
            now,
            String::new(),
        ));
        child.state = JobState::Ready;
        child.last_update = now;
        updated.insert(child.id.as_str().to_string(), child);
    }
}

/// `POST /jobs/` (§6): create N jobs in one transaction. Each job runs the
/// implicit creation transitions (§4.3) before the batch commits.
pub fn bulk_create<C: Clock, G: IdGen>(
    engine: &Engine<C, G>,
    owner_id: &UserId,
    specs: Vec<JobCreateSpec>,
) -> Result<Vec<Job>, EngineError> {
    if specs.is_empty() {
        return Err(EngineError::Validation("bulk_create requires at least one job".into()));
    }

    let jobs = engine.commit(|state| {
        let now = engine.now();
        let mut jobs = Vec::with_capacity(specs.len());
        let mut transfer_items = Vec::new();
        let mut log_events = Vec::new();

        for spec in &specs {
            for parent in &spec.parents {
                let parent_job = state
                    .get_job(parent.as_str())
                    .ok_or_else(|| EngineError::Validation(format!("parent {parent} does not exist")))?;
                if parent_job.owner_id != *owner_id {
                    return Err(EngineError::Validation(format!("parent {parent} must share owner")));
                }
            }

            let job_id = JobId::new(engine.new_id("job"));
            let mut job = Job {
                id: job_id.clone(),
                owner_id: owner_id.clone(),
                app_ref: spec.app_ref.clone(),
                workdir: spec.workdir.clone(),
                parameters: spec.parameters.clone(),
                tags: spec.tags.clone(),
                resources: spec.resources.clone(),
                parents: spec.parents.clone(),
                state: JobState::Created,
                state_message: String::new(),
                state_timestamp: None,
                last_update: now,
                batch_job_ref: None,
                session_ref: None,
                return_code: None,
                batch_job_bound_by_session: false,
                data: spec.data.clone(),
            };

            log_events.push(new_log_event(&engine_id_gen(engine), &job_id, None, JobState::StagedIn, now, String::new()));
            job.state = JobState::StagedIn;

            if job.parents.is_empty() {
                // The row itself is left at `STAGED_IN` (SPEC_FULL §8 S1):
                // only the LogEvent records the `STAGED_IN -> READY`
                // transition. A childless job becomes acquireable via its
                // `STAGED_IN` row state, not a persisted `READY` one.
                log_events.push(new_log_event(
                    &engine_id_gen(engine),
                    &job_id,
                    Some(JobState::StagedIn),
                    JobState::Ready,
                    now,
                    String::new(),
                ));
            } else {
                log_events.push(new_log_event(
                    &engine_id_gen(engine),
                    &job_id,
                    Some(JobState::StagedIn),
                    JobState::AwaitingParents,
                    now,
                    String::new(),
                ));
                job.state = JobState::AwaitingParents;
            }

            for t in &spec.transfer_items {
                transfer_items.push(TransferItem {
                    id: TransferItemId::new(engine.new_id("xfer")),
                    job_ref: job_id.clone(),
                    direction: t.direction,
                    location_alias: t.location_alias.clone(),
                    remote_path: t.remote_path.clone(),
                    local_path: t.local_path.clone(),
                    state: TransferState::Pending,
                    state_timestamp: now,
                });
            }

            jobs.push(job);
        }

        // One `JobCreated` event per job, carrying that job's own transfer
        // items and log events so replay attributes each correctly.
        let mut per_job_events = Vec::with_capacity(jobs.len());
        for job in &jobs {
            let job_transfers: Vec<TransferItem> = transfer_items
                .iter()
                .filter(|t| t.job_ref == job.id)
                .cloned()
                .collect();
            let job_log_events: Vec<LogEvent> = log_events.iter().filter(|e| e.job_ref == job.id).cloned().collect();
            per_job_events.push(Event::JobCreated {
                job: job.clone(),
                transfer_items: job_transfers,
                log_events: job_log_events,
            });
        }

        Ok((jobs.clone(), per_job_events))
    })?;

    engine.notifier.publish(Notification {
        owner_id: owner_id.clone(),
        action: Action::BulkCreate,
        entity: Entity::Job,
        ids: jobs.iter().map(|j| j.id.as_str().to_string()).collect(),
    });
    engine.notifier.publish(Notification {
        owner_id: owner_id.clone(),
        action: Action::BulkCreate,
        entity: Entity::Event,
        ids: jobs.iter().map(|j| j.id.as_str().to_string()).collect(),
    });

    Ok(jobs)
}

/// Helper so the id generator inside `bulk_create`'s closure does not need
/// its own generic threading — `Engine::new_id` already wraps it, but log
/// events need a raw `IdGen` reference for their own id type.
fn engine_id_gen<'a, C: Clock, G: IdGen>(engine: &'a Engine<C, G>) -> IdGenAdapter<'a, C, G> {
    IdGenAdapter(engine)
}

struct IdGenAdapter<'a, C: Clock, G: IdGen>(&'a Engine<C, G>);

impl<C: Clock, G: IdGen> IdGen for IdGenAdapter<'_, C, G> {
    fn next(&self) -> String {
        self.0.new_id("evt")
    }
}

impl<C: Clock, G: IdGen> Clone for IdGenAdapter<'_, C, G> {
    fn clone(&self) -> Self {
        IdGenAdapter(self.0)
    }
}

/// `PATCH /jobs/` (§6): bulk update by id list. Duplicate keys are a
/// `ValidationError` (§4.2); the whole batch aborts if any row fails.
pub fn bulk_update<C: Clock, G: IdGen>(
    engine: &Engine<C, G>,
    owner_id: &UserId,
    patches: Vec<(JobId, JobPatch)>,
) -> Result<Vec<Job>, EngineError> {
    let mut seen = BTreeSet::new();
    for (id, _) in &patches {
        if !seen.insert(id.clone()) {
            return Err(EngineError::Validation(format!("duplicate id {id} in bulk_update")));
        }
    }

    let jobs = engine.commit(|state| {
        let now = engine.now();
        let mut updated: HashMap<String, Job> = HashMap::new();
        let mut log_events = Vec::new();

        for (id, patch) in &patches {
            let current = state
                .get_job(id.as_str())
                .filter(|j| j.owner_id == *owner_id)
                .ok_or(EngineError::NotFound)?;
            let mut job = current.clone();

            if let Some(new_parents) = &patch.parents {
                for parent in new_parents {
                    let parent_job = state
                        .get_job(parent.as_str())
                        .ok_or_else(|| EngineError::Validation(format!("parent {parent} does not exist")))?;
                    if parent_job.owner_id != *owner_id {
                        return Err(EngineError::Validation(format!("parent {parent} must share owner")));
                    }
                }
            }

            if let Some(new_state) = patch.state {
                if new_state != job.state {
                    validate_transition(job.state, new_state, TransitionActor::Client)?;
                    log_events.push(new_log_event(
                        &engine_id_gen(engine),
                        &job.id,
                        Some(job.state),
                        new_state,
                        now,
                        patch.state_message.clone().unwrap_or_default(),
                    ));
                    job.state = new_state;
                }
            }

            apply_field_patch(&mut job, patch);
            job.last_update = now;
            updated.insert(job.id.as_str().to_string(), job);
        }

        recompute_child_readiness(state, owner_id, &mut updated, &mut log_events, &engine_id_gen(engine), now);

        let mut jobs: Vec<Job> = updated.into_values().collect();
        jobs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok((jobs.clone(), vec![Event::JobsReplaced { jobs, log_events }]))
    })?;

    engine.notifier.publish(Notification {
        owner_id: owner_id.clone(),
        action: Action::BulkUpdate,
        entity: Entity::Job,
        ids: jobs.iter().map(|j| j.id.as_str().to_string()).collect(),
    });

    Ok(jobs)
}

/// `PUT /jobs/` (§6): update every job matching `filter` with the same
/// patch, in one transaction.
pub fn update_by_query<C: Clock, G: IdGen>(
    engine: &Engine<C, G>,
    owner_id: &UserId,
    filter: &JobFilter,
    patch: JobPatch,
) -> Result<Vec<Job>, EngineError> {
    let jobs = engine.commit(|state| {
        let now = engine.now();
        let matching: Vec<JobId> = jobctl_query::jobs::list(state, owner_id, filter, &[], jobctl_query::Paginator::new(0, usize::MAX))
            .results
            .into_iter()
            .map(|j| j.id)
            .collect();

        let mut updated: HashMap<String, Job> = HashMap::new();
        let mut log_events = Vec::new();

        for id in &matching {
            let current = state.get_job(id.as_str()).ok_or(EngineError::NotFound)?;
            let mut job = current.clone();

            if let Some(new_state) = patch.state {
                if new_state != job.state {
                    validate_transition(job.state, new_state, TransitionActor::Client)?;
                    log_events.push(new_log_event(
                        &engine_id_gen(engine),
                        &job.id,
                        Some(job.state),
                        new_state,
                        now,
                        patch.state_message.clone().unwrap_or_default(),
                    ));
                    job.state = new_state;
                }
            }
            apply_field_patch(&mut job, &patch);
            job.last_update = now;
            updated.insert(job.id.as_str().to_string(), job);
        }

        recompute_child_readiness(state, owner_id, &mut updated, &mut log_events, &engine_id_gen(engine), now);

        let mut jobs: Vec<Job> = updated.into_values().collect();
        jobs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok((jobs.clone(), vec![Event::JobsReplaced { jobs, log_events }]))
    })?;

    engine.notifier.publish(Notification {
        owner_id: owner_id.clone(),
        action: Action::BulkUpdate,
        entity: Entity::Job,
        ids: jobs.iter().map(|j| j.id.as_str().to_string()).collect(),
    });

    Ok(jobs)
}

/// `DELETE /jobs/` (§6): delete every job matching `filter`.
pub fn delete_by_query<C: Clock, G: IdGen>(
    engine: &Engine<C, G>,
    owner_id: &UserId,
    filter: &JobFilter,
) -> Result<Vec<JobId>, EngineError> {
    let ids = engine.commit(|state| {
        let ids: Vec<JobId> = jobctl_query::jobs::list(state, owner_id, filter, &[], jobctl_query::Paginator::new(0, usize::MAX))
            .results
            .into_iter()
            .map(|j| j.id)
            .collect();
        Ok((ids.clone(), vec![Event::JobsDeleted { ids }]))
    })?;

    engine.notifier.publish(Notification {
        owner_id: owner_id.clone(),
        action: Action::BulkDelete,
        entity: Entity::Job,
        ids: ids.iter().map(|i| i.as_str().to_string()).collect(),
    });

    Ok(ids)
}
