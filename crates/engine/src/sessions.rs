// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle & the acquisition engine (§4.4): lease assignment,
//! node-resource bin-packing, heartbeat expiry, release on close/delete.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use jobctl_core::{
    AcquireSpec, BatchJobId, Clock, Event, IdGen, Job, NodeResources, Session, SessionId, SiteId,
    UserId,
};
use jobctl_query::jobs::JobFilter;
use jobctl_query::order::parse_order_by;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::EngineError;
use crate::notifier::{Action, Entity, Notification};
use crate::store::Engine;

/// Request body of `POST /sessions/` (§6, §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOpenSpec {
    pub site_ref: SiteId,
    pub batch_job_ref: Option<BatchJobId>,
}

/// `POST /sessions/`: open a lease scope against a Site, optionally bound
/// to a BatchJob from the start.
pub fn open<C: Clock, G: IdGen>(
    engine: &Engine<C, G>,
    owner_id: &UserId,
    spec: SessionOpenSpec,
) -> Result<Session, EngineError> {
    engine.commit(|state| {
        let site = state
            .get_site(spec.site_ref.as_str())
            .filter(|s| s.owner_id == *owner_id)
            .ok_or(EngineError::NotFound)?;

        if let Some(bj_id) = &spec.batch_job_ref {
            let bj = state
                .get_batch_job(bj_id.as_str())
                .filter(|bj| bj.owner_id == *owner_id)
                .ok_or(EngineError::NotFound)?;
            if bj.site_ref != site.id {
                return Err(EngineError::Validation(format!(
                    "batch job {bj_id} does not belong to site {}",
                    site.id
                )));
            }
        }

        let now = engine.now();
        let session = Session {
            id: SessionId::new(engine.new_id("sess")),
            owner_id: owner_id.clone(),
            site_ref: spec.site_ref,
            batch_job_ref: spec.batch_job_ref,
            heartbeat: now,
            acquired_job_refs: BTreeSet::new(),
        };

        Ok((session.clone(), vec![Event::SessionOpened { session }]))
    })
}

/// `/sessions/{id}/ticks`: refresh the lease's heartbeat (§4.4).
pub fn tick<C: Clock, G: IdGen>(
    engine: &Engine<C, G>,
    owner_id: &UserId,
    session_id: &SessionId,
) -> Result<Session, EngineError> {
    engine.commit(|state| {
        let mut session = state
            .get_session(session_id.as_str())
            .filter(|s| s.owner_id == *owner_id)
            .cloned()
            .ok_or(EngineError::NotFound)?;
        let now = engine.now();
        session.heartbeat = now;

        Ok((
            session.clone(),
            vec![Event::SessionTicked {
                id: session.id,
                heartbeat: now,
            }],
        ))
    })
}

/// Release every job acquired by `session_id` (§4.4: "close" and the expiry
/// sweep share this rule): clear `session_ref`, and `batch_job_ref` only if
/// it was bound implicitly by `acquire`. No LogEvent and no state change
/// accompanies a release (§4.4 "Close", testable property #6) — the
/// `JobsReplaced` event carries an empty `log_events` list.
fn released_jobs(state: &jobctl_storage::MaterializedState, session_id: &SessionId, now: DateTime<Utc>) -> Vec<Job> {
    state
        .jobs
        .values()
        .filter(|j| j.session_ref.as_ref() == Some(session_id))
        .cloned()
        .map(|mut j| {
            j.session_ref = None;
            if j.batch_job_bound_by_session {
                j.batch_job_ref = None;
                j.batch_job_bound_by_session = false;
            }
            j.last_update = now;
            j
        })
        .collect()
}

/// `/sessions/{id}` `DELETE`: close a Session explicitly.
pub fn close<C: Clock, G: IdGen>(
    engine: &Engine<C, G>,
    owner_id: &UserId,
    session_id: &SessionId,
) -> Result<Vec<Job>, EngineError> {
    let jobs = engine.commit(|state| {
        state
            .get_session(session_id.as_str())
            .filter(|s| s.owner_id == *owner_id)
            .ok_or(EngineError::NotFound)?;

        let now = engine.now();
        let jobs = released_jobs(state, session_id, now);

        let mut events = vec![Event::SessionClosed { id: session_id.clone() }];
        if !jobs.is_empty() {
            events.push(Event::JobsReplaced {
                jobs: jobs.clone(),
                log_events: Vec::new(),
            });
        }
        Ok((jobs, events))
    })?;

    if !jobs.is_empty() {
        engine.notifier.publish(Notification {
            owner_id: owner_id.clone(),
            action: Action::BulkUpdate,
            entity: Entity::Job,
            ids: jobs.iter().map(|j| j.id.as_str().to_string()).collect(),
        });
    }

    Ok(jobs)
}

/// Background reap (§4.4, §5: "the session-expiry sweeper, which is
/// idempotent and safe to restart"). Not owner-scoped: this runs as a
/// process-wide timer, not in response to a single client's request.
/// Returns the ids of the sessions it expired.
pub fn sweep_expired<C: Clock, G: IdGen>(engine: &Engine<C, G>) -> Result<Vec<SessionId>, EngineError> {
    let result = engine.commit(|state| {
        let now = engine.now();
        let expiry = engine.config.session_expiry;

        let expired: Vec<Session> = state
            .sessions
            .values()
            .filter(|s| s.is_expired(now, expiry))
            .cloned()
            .collect();

        if expired.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }

        let mut all_released: Vec<Job> = Vec::new();
        let mut events = Vec::new();
        let mut expired_ids = Vec::new();
        for session in &expired {
            let jobs = released_jobs(state, &session.id, now);
            all_released.extend(jobs);
            events.push(Event::SessionClosed { id: session.id.clone() });
            expired_ids.push(session.id.clone());
        }
        if !all_released.is_empty() {
            events.push(Event::JobsReplaced {
                jobs: all_released,
                log_events: Vec::new(),
            });
        }

        Ok((expired_ids, events))
    });

    if let Ok(expired) = &result {
        if !expired.is_empty() {
            info!(count = expired.len(), "reaped expired sessions");
        }
    }
    result
}

/// Whether `job`'s batch-job binding satisfies acquisition rules 5/6 (§4.4).
/// `None` means the candidate is ineligible; `Some(set_batch_job_ref)` means
/// it is eligible, optionally carrying the batch job id to bind.
fn binding_outcome(
    state: &jobctl_storage::MaterializedState,
    spec: &AcquireSpec,
    session: &Session,
    job: &Job,
) -> Option<Option<BatchJobId>> {
    if spec.acquire_unbound {
        return if job.batch_job_ref.is_some() { None } else { Some(None) };
    }

    match &session.batch_job_ref {
        None => Some(None),
        Some(session_bj) => {
            if job.batch_job_ref.as_ref() == Some(session_bj) {
                Some(None)
            } else if job.batch_job_ref.is_none() {
                let bj = state.get_batch_job(session_bj.as_str())?;
                let eligible = bj.filter_tags.iter().all(|(k, v)| job.tags.get(k) == Some(v));
                eligible.then(|| Some(session_bj.clone()))
            } else {
                None
            }
        }
    }
}

/// Try to place `job` on the lowest-indexed node of `resources` satisfying
/// all five predicates (§4.4), mutating the node's budgets in place on
/// success. A job whose `wall_time_min` exceeds the window is a hard
/// reject that never attempts placement.
fn try_place(resources: &mut NodeResources, job: &Job) -> bool {
    if job.resources.wall_time_min > resources.max_wall_time_min {
        return false;
    }
    let needed_cores = job.resources.ranks_per_node * job.resources.threads_per_rank;
    let needed_gpus = job.resources.ranks_per_node * job.resources.gpus_per_rank;

    let node = (0..resources.num_nodes()).find(|&n| {
        resources.running_job_counts[n] < resources.max_jobs_per_node
            && resources.node_occupancies[n] + 1.0 / f64::from(job.resources.node_packing_count) <= 1.0
            && resources.idle_cores[n] >= needed_cores
            && resources.idle_gpus[n] >= needed_gpus
    });

    match node {
        Some(n) => {
            resources.running_job_counts[n] += 1;
            resources.node_occupancies[n] += 1.0 / f64::from(job.resources.node_packing_count);
            resources.idle_cores[n] -= needed_cores;
            resources.idle_gpus[n] -= needed_gpus;
            true
        }
        None => false,
    }
}

/// `/sessions/{id}/acquire`: lease up to `spec.max_num_acquire` eligible
/// Jobs (§4.4). Candidate selection and the write that sets
/// `session_ref`/`batch_job_ref` run inside one `Engine::commit`, which is
/// how two concurrent acquires never lease the same Job (§4.4, §5.1).
pub fn acquire<C: Clock, G: IdGen>(
    engine: &Engine<C, G>,
    owner_id: &UserId,
    session_id: &SessionId,
    spec: AcquireSpec,
) -> Result<Vec<Job>, EngineError> {
    let jobs = engine.commit(|state| {
        let session = state
            .get_session(session_id.as_str())
            .filter(|s| s.owner_id == *owner_id)
            .cloned()
            .ok_or(EngineError::NotFound)?;

        let now = engine.now();
        let max_acquire = spec.max_num_acquire.min(engine.config.max_num_acquire) as usize;

        let filter = JobFilter {
            site_id: Some(session.site_ref.clone()),
            state_in: Some(spec.states.clone()),
            tags_superset: spec.filter_tags.clone(),
            ..Default::default()
        };
        let order_by = parse_order_by(&spec.order_by);
        let candidates = jobctl_query::jobs::list(
            state,
            owner_id,
            &filter,
            &order_by,
            jobctl_query::Paginator::new(0, usize::MAX),
        )
        .results;

        let mut node_resources = spec.node_resources.clone();
        let mut acquired: Vec<Job> = Vec::new();

        for mut job in candidates {
            if acquired.len() >= max_acquire {
                break;
            }
            if job.session_ref.is_some() {
                continue;
            }
            let set_batch_job_ref = match binding_outcome(state, &spec, &session, &job) {
                Some(outcome) => outcome,
                None => continue,
            };
            if let Some(resources) = node_resources.as_mut() {
                if !try_place(resources, &job) {
                    continue;
                }
            }

            job.session_ref = Some(session.id.clone());
            if let Some(bj) = set_batch_job_ref {
                job.batch_job_ref = Some(bj);
                job.batch_job_bound_by_session = true;
            }
            job.last_update = now;
            acquired.push(job);
        }

        if acquired.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }

        let acquired_ids: BTreeSet<_> = acquired.iter().map(|j| j.id.clone()).collect();
        let events = vec![
            Event::JobsReplaced {
                jobs: acquired.clone(),
                log_events: Vec::new(),
            },
            Event::SessionJobsAcquired {
                id: session.id,
                job_refs: acquired_ids,
            },
        ];
        Ok((acquired, events))
    })?;

    if !jobs.is_empty() {
        engine.notifier.publish(Notification {
            owner_id: owner_id.clone(),
            action: Action::BulkUpdate,
            entity: Entity::Job,
            ids: jobs.iter().map(|j| j.id.as_str().to_string()).collect(),
        });
    }

    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_engine;
    use jobctl_core::{JobState, ResourceHints};

    type TestEngine = Engine<jobctl_core::FakeClock, jobctl_core::SequentialIdGen>;

    fn seed_job(engine: &TestEngine, owner: &UserId, workdir: &str) -> Job {
        crate::jobs::bulk_create(
            engine,
            owner,
            vec![crate::jobs::JobCreateSpec {
                app_ref: jobctl_core::AppId::new("app-1"),
                workdir: workdir.into(),
                ..Default::default()
            }],
        )
        .unwrap()
        .remove(0)
    }

    fn seed_job_with_resources(engine: &TestEngine, owner: &UserId, workdir: &str, resources: ResourceHints) -> Job {
        crate::jobs::bulk_create(
            engine,
            owner,
            vec![crate::jobs::JobCreateSpec {
                app_ref: jobctl_core::AppId::new("app-1"),
                workdir: workdir.into(),
                resources,
                ..Default::default()
            }],
        )
        .unwrap()
        .remove(0)
    }

    fn seed_site(engine: &TestEngine, owner: &UserId) -> SiteId {
        let site = jobctl_core::testing::site("site-1", owner.as_str(), "theta", "/projects/foo");
        engine
            .commit(|_state| Ok((site.clone(), vec![Event::SiteCreated { site: site.clone() }])))
            .map(|s: jobctl_core::Site| s.id)
            .unwrap()
    }

    #[test]
    fn scenario_s2_acquire_leases_three_childless_jobs() {
        let engine = test_engine();
        let owner = UserId::new("u1");
        let site_id = seed_site(&engine, &owner);
        for i in 0..3 {
            seed_job(&engine, &owner, &format!("w{i}"));
        }
        let session = open(
            &engine,
            &owner,
            SessionOpenSpec {
                site_ref: site_id,
                batch_job_ref: None,
            },
        )
        .unwrap();

        let spec = AcquireSpec {
            states: vec![JobState::StagedIn],
            max_num_acquire: 10,
            ..Default::default()
        };
        let leased = acquire(&engine, &owner, &session.id, spec).unwrap();
        assert_eq!(leased.len(), 3);
        assert!(leased.iter().all(|j| j.lock_status() == jobctl_core::LockStatus::Preprocessing));
    }

    #[test]
    fn acquire_never_double_leases_an_already_bound_job() {
        let engine = test_engine();
        let owner = UserId::new("u1");
        let site_id = seed_site(&engine, &owner);
        seed_job(&engine, &owner, "w0");
        let s1 = open(
            &engine,
            &owner,
            SessionOpenSpec {
                site_ref: site_id.clone(),
                batch_job_ref: None,
            },
        )
        .unwrap();
        let s2 = open(
            &engine,
            &owner,
            SessionOpenSpec {
                site_ref: site_id,
                batch_job_ref: None,
            },
        )
        .unwrap();

        let spec = AcquireSpec {
            states: vec![JobState::StagedIn],
            max_num_acquire: 10,
            ..Default::default()
        };
        let first = acquire(&engine, &owner, &s1.id, spec.clone()).unwrap();
        let second = acquire(&engine, &owner, &s2.id, spec).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 0, "already-leased job must not be returned to a second session");
    }

    #[test]
    fn scenario_s3_bin_packing_picks_the_fitting_descending_jobs() {
        let engine = test_engine();
        let owner = UserId::new("u1");
        let site_id = seed_site(&engine, &owner);

        let make = |wall: u32, threads: u32| ResourceHints {
            ranks_per_node: 1,
            threads_per_rank: threads,
            node_packing_count: 4,
            wall_time_min: wall,
            gpus_per_rank: 0,
            launch_params: String::new(),
        };
        seed_job_with_resources(&engine, &owner, "j31", make(31, 4));
        seed_job_with_resources(&engine, &owner, "j40", make(40, 1));
        seed_job_with_resources(&engine, &owner, "j32", make(32, 4));
        seed_job_with_resources(&engine, &owner, "j33", make(33, 4));

        let session = open(
            &engine,
            &owner,
            SessionOpenSpec {
                site_ref: site_id,
                batch_job_ref: None,
            },
        )
        .unwrap();

        let node_resources = NodeResources {
            max_jobs_per_node: 8,
            max_wall_time_min: 35,
            running_job_counts: vec![2, 0],
            node_occupancies: vec![0.6, 0.0],
            idle_cores: vec![3, 8],
            idle_gpus: vec![0, 0],
        };
        let spec = AcquireSpec {
            states: vec![JobState::StagedIn],
            max_num_acquire: 10,
            node_resources: Some(node_resources),
            order_by: vec!["-wall_time_min".into()],
            ..Default::default()
        };
        let leased = acquire(&engine, &owner, &session.id, spec).unwrap();
        let workdirs: Vec<_> = leased.iter().map(|j| j.workdir.clone()).collect();
        assert_eq!(workdirs, vec!["j33".to_string(), "j32".to_string()]);
    }

    #[test]
    fn scenario_s6_close_releases_jobs_without_state_change_or_log_event() {
        let engine = test_engine();
        let owner = UserId::new("u1");
        let site_id = seed_site(&engine, &owner);
        seed_job(&engine, &owner, "w0");
        let session = open(
            &engine,
            &owner,
            SessionOpenSpec {
                site_ref: site_id,
                batch_job_ref: None,
            },
        )
        .unwrap();
        let spec = AcquireSpec {
            states: vec![JobState::StagedIn],
            max_num_acquire: 10,
            ..Default::default()
        };
        let leased = acquire(&engine, &owner, &session.id, spec).unwrap();
        assert_eq!(leased.len(), 1);
        let job_id = leased[0].id.clone();
        let before_events = engine.with_state(|state| state.events_for_job(job_id.as_str()).len());

        let released = close(&engine, &owner, &session.id).unwrap();
        assert_eq!(released.len(), 1);
        let after = engine.with_state(|state| state.get_job(job_id.as_str()).cloned().unwrap());
        assert_eq!(after.state, JobState::StagedIn, "no state change on release");
        assert_eq!(after.lock_status(), jobctl_core::LockStatus::Unlocked);
        let after_events = engine.with_state(|state| state.events_for_job(job_id.as_str()).len());
        assert_eq!(after_events, before_events, "no new LogEvent for the released job");
        assert!(engine.with_state(|state| state.get_session(session.id.as_str()).is_none()));
    }

    #[test]
    fn sweep_leaves_sessions_with_a_fresh_heartbeat_alone() {
        let engine = test_engine();
        let owner = UserId::new("u1");
        let site_id = seed_site(&engine, &owner);
        seed_job(&engine, &owner, "w0");
        let session = open(
            &engine,
            &owner,
            SessionOpenSpec {
                site_ref: site_id,
                batch_job_ref: None,
            },
        )
        .unwrap();
        let spec = AcquireSpec {
            states: vec![JobState::StagedIn],
            max_num_acquire: 10,
            ..Default::default()
        };
        acquire(&engine, &owner, &session.id, spec).unwrap();

        let expired = sweep_expired(&engine).unwrap();
        assert!(expired.is_empty(), "fresh heartbeat is not yet expired");
    }

    #[test]
    fn sweep_expires_stale_session_and_releases_its_job() {
        let dir = tempfile::tempdir().unwrap();
        let wal = jobctl_storage::Wal::open(&dir.path().join("events.wal"), 0).unwrap();
        let clock = jobctl_core::FakeClock::new("2026-01-01T00:00:00Z".parse().unwrap());
        let engine: TestEngine = Engine::new(
            jobctl_storage::MaterializedState::default(),
            wal,
            clock.clone(),
            jobctl_core::SequentialIdGen::new("t"),
            crate::config::EngineConfig::default(),
        );

        let owner = UserId::new("u1");
        let site_id = seed_site(&engine, &owner);
        let job = seed_job(&engine, &owner, "w0");
        let session = open(
            &engine,
            &owner,
            SessionOpenSpec {
                site_ref: site_id,
                batch_job_ref: None,
            },
        )
        .unwrap();
        let spec = AcquireSpec {
            states: vec![JobState::StagedIn],
            max_num_acquire: 10,
            ..Default::default()
        };
        acquire(&engine, &owner, &session.id, spec).unwrap();

        clock.advance(chrono::Duration::seconds(301));
        let expired = sweep_expired(&engine).unwrap();
        assert_eq!(expired, vec![session.id.clone()]);

        let after = engine.with_state(|state| state.get_job(job.id.as_str()).cloned().unwrap());
        assert!(after.session_ref.is_none());
        assert!(engine.with_state(|state| state.get_session(session.id.as_str()).is_none()));
    }
}
