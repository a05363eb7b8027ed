// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The seven testable-property invariants. Acquisition exclusivity (1),
//! event log faithfulness (2), owner isolation (3), and round-trip
//! filter+order pagination (5) get dedicated checks here; freeze (4),
//! session release (6), and parent readiness (7) are exercised end-to-end
//! by `scenarios::s4_*`/`s6_*`/`s5_*` and are not duplicated.

use std::collections::BTreeSet;
use std::sync::Arc;

use jobctl_core::{AcquireSpec, JobState, OrderKey};
use jobctl_engine::jobs::JobPatch;
use jobctl_engine::sessions::SessionOpenSpec;
use jobctl_query::jobs::JobFilter;
use jobctl_query::Paginator;

use crate::prelude::*;

#[test]
fn property_1_two_concurrent_sessions_never_acquire_the_same_job() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Arc::new(engine_in(dir.path(), "p1"));
    let owner = owner("u1");
    let site = create_site(&engine, &owner, "theta", "/projects/foo");
    let app = create_app(&engine, &owner, "nw-opt", vec![], vec![]);
    for i in 0..40 {
        create_childless_job(&engine, &owner, &app.id, &format!("w{i}"));
    }

    let sessions: Vec<_> = (0..4)
        .map(|_| {
            jobctl_engine::sessions::open(
                &engine,
                &owner,
                SessionOpenSpec { site_ref: site.id.clone(), batch_job_ref: None },
            )
            .unwrap()
        })
        .collect();

    let results: Vec<Vec<jobctl_core::Job>> = std::thread::scope(|s| {
        let handles: Vec<_> = sessions
            .iter()
            .map(|session| {
                let engine = Arc::clone(&engine);
                let owner = owner.clone();
                let session_id = session.id.clone();
                s.spawn(move || {
                    jobctl_engine::sessions::acquire(
                        &engine,
                        &owner,
                        &session_id,
                        AcquireSpec {
                            states: vec![JobState::StagedIn],
                            max_num_acquire: 15,
                            ..Default::default()
                        },
                    )
                    .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut seen: BTreeSet<jobctl_core::JobId> = BTreeSet::new();
    let mut total = 0;
    for leased in &results {
        total += leased.len();
        for job in leased {
            assert!(seen.insert(job.id.clone()), "job {} leased by more than one session", job.id);
        }
    }
    assert_eq!(total, 40, "every job should have been leased exactly once across the four sessions");
}

#[test]
fn property_2_event_log_is_exactly_the_distinct_states_held_no_op_suppressed() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_in(dir.path(), "p2");
    let owner = owner("u1");
    let app = create_app(&engine, &owner, "nw-opt", vec![], vec![]);
    let job = create_childless_job(&engine, &owner, &app.id, "w0");
    assert_eq!(job.state, JobState::StagedIn);

    // A patch proposing the job's current row state is a no-op: no new LogEvent.
    let before = engine.with_state(|state| state.events_for_job(job.id.as_str()).len());
    jobctl_engine::jobs::bulk_update(
        &engine,
        &owner,
        vec![(job.id.clone(), JobPatch { state: Some(JobState::StagedIn), ..Default::default() })],
    )
    .unwrap();
    let after = engine.with_state(|state| state.events_for_job(job.id.as_str()).len());
    assert_eq!(after, before, "re-proposing the current state must not emit a LogEvent");

    // A real transition appends exactly one event, and the full history is
    // exactly the distinct states the job has held, in order.
    jobctl_engine::jobs::bulk_update(
        &engine,
        &owner,
        vec![(job.id.clone(), JobPatch { state: Some(JobState::Preprocessed), ..Default::default() })],
    )
    .unwrap();
    let history = engine.with_state(|state| {
        state
            .events_for_job(job.id.as_str())
            .into_iter()
            .map(|e| e.to_state)
            .collect::<Vec<_>>()
    });
    assert_eq!(history, vec![JobState::StagedIn, JobState::Ready, JobState::Preprocessed]);
}

#[test]
fn property_3_owner_isolation_across_get_and_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_in(dir.path(), "p3");
    let u1 = owner("u1");
    let u2 = owner("u2");
    let app = create_app(&engine, &u1, "nw-opt", vec![], vec![]);
    let job = create_childless_job(&engine, &u1, &app.id, "w0");

    // GET: v's list never returns u's row.
    let v_page = engine.with_state(|state| {
        jobctl_query::jobs::list(state, &u2, &JobFilter::default(), &[], Paginator::new(0, 100))
    });
    assert_eq!(v_page.count, 0);

    let v_get = engine.with_state(|state| {
        let filter = JobFilter { id_in: Some(vec![job.id.clone()]), ..Default::default() };
        jobctl_query::jobs::get(state, &u2, &filter)
    });
    assert!(matches!(v_get, Err(jobctl_query::QueryError::DoesNotExist)));

    // PATCH: v cannot mutate u's job.
    let err = jobctl_engine::jobs::bulk_update(
        &engine,
        &u2,
        vec![(job.id.clone(), JobPatch { state: Some(JobState::Preprocessed), ..Default::default() })],
    )
    .unwrap_err();
    assert!(matches!(err, jobctl_engine::EngineError::NotFound));

    // DELETE by query: v's delete-by-query matches nothing of u's.
    let deleted = jobctl_engine::jobs::delete_by_query(&engine, &u2, &JobFilter::default()).unwrap();
    assert!(deleted.is_empty());
    assert!(engine.with_state(|state| state.get_job(job.id.as_str()).is_some()), "u1's job must survive v's delete");
}

#[test]
fn property_5_consecutive_pages_concatenate_to_the_full_ordered_filtered_set() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_in(dir.path(), "p5");
    let owner = owner("u1");
    let app = create_app(&engine, &owner, "nw-opt", vec![], vec![]);
    for i in 0..17 {
        create_childless_job(&engine, &owner, &app.id, &format!("job-{i:02}"));
    }

    let filter = JobFilter { workdir_contains: Some("job-".into()), ..Default::default() };
    let order = vec![OrderKey { field: "workdir".into(), descending: true }];

    let full = engine.with_state(|state| jobctl_query::jobs::list(state, &owner, &filter, &order, Paginator::new(0, usize::MAX)));
    assert_eq!(full.count, 17);

    let page_size = 5;
    let mut concatenated = Vec::new();
    let mut offset = 0;
    loop {
        let page = engine.with_state(|state| jobctl_query::jobs::list(state, &owner, &filter, &order, Paginator::new(offset, page_size)));
        if page.results.is_empty() {
            break;
        }
        concatenated.extend(page.results.into_iter().map(|j| j.id));
        offset += page_size;
    }

    let full_ids: Vec<_> = full.results.into_iter().map(|j| j.id).collect();
    assert_eq!(concatenated, full_ids, "paged concatenation must equal the full ordered set");

    let mut dedup = concatenated.clone();
    dedup.sort();
    dedup.dedup();
    assert_eq!(dedup.len(), concatenated.len(), "no job should appear on more than one page");
}

#[test]
fn property_6_session_delete_unlocks_without_persisting_a_state_change() {
    // Covered end-to-end by `scenarios::s6_closing_a_session_releases_its_jobs_without_a_state_change`;
    // this check adds the one angle that scenario doesn't: the session row
    // itself is gone afterward, so a second close is `NotFound` rather than a silent no-op.
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_in(dir.path(), "p6");
    let owner = owner("u1");
    let site = create_site(&engine, &owner, "theta", "/projects/foo");
    let app = create_app(&engine, &owner, "nw-opt", vec![], vec![]);
    create_childless_job(&engine, &owner, &app.id, "w0");
    let session = jobctl_engine::sessions::open(
        &engine,
        &owner,
        SessionOpenSpec { site_ref: site.id, batch_job_ref: None },
    )
    .unwrap();
    jobctl_engine::sessions::acquire(
        &engine,
        &owner,
        &session.id,
        AcquireSpec { states: vec![JobState::StagedIn], max_num_acquire: 10, ..Default::default() },
    )
    .unwrap();

    jobctl_engine::sessions::close(&engine, &owner, &session.id).unwrap();
    let err = jobctl_engine::sessions::close(&engine, &owner, &session.id).unwrap_err();
    assert!(matches!(err, jobctl_engine::EngineError::NotFound));
}

#[test]
fn property_7_last_parent_finishing_flips_child_from_awaiting_to_ready() {
    // Covered end-to-end by `scenarios::s5_child_becomes_ready_once_its_only_parent_finishes`;
    // this check adds the multi-parent angle: the child stays AWAITING_PARENTS
    // until *every* parent, not just one, reaches JOB_FINISHED.
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_in(dir.path(), "p7");
    let owner = owner("u1");
    let app = create_app(&engine, &owner, "nw-opt", vec![], vec![]);

    let p1 = create_childless_job(&engine, &owner, &app.id, "p1");
    let p2 = create_childless_job(&engine, &owner, &app.id, "p2");
    let mut parents = BTreeSet::new();
    parents.insert(p1.id.clone());
    parents.insert(p2.id.clone());
    let child = create_job_with_parents(&engine, &owner, &app.id, "c", parents);

    let chain = [
        JobState::Preprocessed,
        JobState::Running,
        JobState::RunDone,
        JobState::StagedOut,
        JobState::JobFinished,
    ];
    for to in chain {
        jobctl_engine::jobs::bulk_update(&engine, &owner, vec![(p1.id.clone(), JobPatch { state: Some(to), ..Default::default() })]).unwrap();
    }
    let child_after_one_parent = engine.with_state(|state| state.get_job(child.id.as_str()).cloned().unwrap());
    assert_eq!(child_after_one_parent.state, JobState::AwaitingParents, "one finished parent is not enough");

    for to in chain {
        jobctl_engine::jobs::bulk_update(&engine, &owner, vec![(p2.id.clone(), JobPatch { state: Some(to), ..Default::default() })]).unwrap();
    }
    let child_after_both = engine.with_state(|state| state.get_job(child.id.as_str()).cloned().unwrap());
    assert_eq!(child_after_both.state, JobState::Ready);
}
