// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenarios S1-S6, driven against the full `core`/`storage`/
//! `query`/`engine` stack rather than any single crate's unit tests, with a
//! real on-disk WAL underneath each `Engine`.

use std::collections::{BTreeMap, BTreeSet};

use jobctl_core::{
    AcquireSpec, AppId, JobState, LockStatus, NodeResources, ResourceHints,
};
use jobctl_engine::batch_jobs::{BatchJobCreateSpec, BatchJobPatch};
use jobctl_engine::jobs::JobPatch;
use jobctl_engine::sessions::SessionOpenSpec;

use crate::prelude::*;

#[test]
fn s1_childless_job_reaches_ready_via_staged_in() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_in(dir.path(), "s1");
    let owner = owner("u1");

    let site = create_site(&engine, &owner, "theta", "/projects/foo");
    let app = create_app(
        &engine,
        &owner,
        "nw-opt",
        vec![jobctl_core::AppBackend {
            site_ref: site.id.clone(),
            class_name: "nwchem.GeomOpt".into(),
            site_hostname: String::new(),
            site_path: String::new(),
        }],
        vec!["geometry"],
    );

    let mut parameters = BTreeMap::new();
    parameters.insert("geometry".to_string(), "test.xyz".to_string());
    let resources = ResourceHints {
        ranks_per_node: 64,
        ..Default::default()
    };
    let job = create_job(&engine, &owner, &app.id, "test/say-hello", parameters, resources);

    assert_eq!(job.state, JobState::StagedIn);
    assert_eq!(job.lock_status(), LockStatus::Unlocked);

    let history = engine.with_state(|state| {
        state
            .events_for_job(job.id.as_str())
            .into_iter()
            .map(|e| e.to_state)
            .collect::<Vec<_>>()
    });
    assert_eq!(history, vec![JobState::StagedIn, JobState::Ready]);
}

#[test]
fn s2_acquire_leases_three_childless_jobs_as_preprocessing() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_in(dir.path(), "s2");
    let owner = owner("u1");
    let site = create_site(&engine, &owner, "theta", "/projects/foo");
    let app = create_app(
        &engine,
        &owner,
        "nw-opt",
        vec![jobctl_core::AppBackend {
            site_ref: site.id.clone(),
            class_name: "nwchem.GeomOpt".into(),
            site_hostname: String::new(),
            site_path: String::new(),
        }],
        vec![],
    );
    for i in 0..3 {
        create_childless_job(&engine, &owner, &app.id, &format!("w{i}"));
    }

    let session = jobctl_engine::sessions::open(
        &engine,
        &owner,
        SessionOpenSpec { site_ref: site.id, batch_job_ref: None },
    )
    .unwrap();

    let leased = jobctl_engine::sessions::acquire(
        &engine,
        &owner,
        &session.id,
        AcquireSpec {
            states: vec![JobState::StagedIn],
            max_num_acquire: 10,
            acquire_unbound: false,
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(leased.len(), 3);
    assert!(leased.iter().all(|j| j.lock_status() == LockStatus::Preprocessing));
}

#[test]
fn s3_bin_packing_skips_the_over_window_and_budget_exhausted_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_in(dir.path(), "s3");
    let owner = owner("u1");
    let site = create_site(&engine, &owner, "theta", "/projects/foo");
    let app = create_app(
        &engine,
        &owner,
        "nw-opt",
        vec![jobctl_core::AppBackend {
            site_ref: site.id.clone(),
            class_name: "nwchem.GeomOpt".into(),
            site_hostname: String::new(),
            site_path: String::new(),
        }],
        vec![],
    );

    let make = |wall: u32, threads: u32| ResourceHints {
        ranks_per_node: 1,
        threads_per_rank: threads,
        node_packing_count: 4,
        wall_time_min: wall,
        gpus_per_rank: 0,
        launch_params: String::new(),
    };
    create_job(&engine, &owner, &app.id, "j31", BTreeMap::new(), make(31, 4));
    create_job(&engine, &owner, &app.id, "j40", BTreeMap::new(), make(40, 1));
    create_job(&engine, &owner, &app.id, "j32", BTreeMap::new(), make(32, 4));
    create_job(&engine, &owner, &app.id, "j33", BTreeMap::new(), make(33, 4));

    let session = jobctl_engine::sessions::open(
        &engine,
        &owner,
        SessionOpenSpec { site_ref: site.id, batch_job_ref: None },
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
    let leased = jobctl_engine::sessions::acquire(
        &engine,
        &owner,
        &session.id,
        AcquireSpec {
            states: vec![JobState::StagedIn],
            max_num_acquire: 10,
            node_resources: Some(node_resources),
            order_by: vec!["-wall_time_min".into()],
            ..Default::default()
        },
    )
    .unwrap();

    let workdirs: Vec<_> = leased.iter().map(|j| j.workdir.clone()).collect();
    assert_eq!(workdirs, vec!["j33".to_string(), "j32".to_string()]);
}

#[test]
fn s4_batch_job_freeze_and_revert_protocol() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_in(dir.path(), "s4");
    let owner = owner("u1");
    let site = create_site(&engine, &owner, "theta", "/projects/foo");

    let bj = jobctl_engine::batch_jobs::create(
        &engine,
        &owner,
        BatchJobCreateSpec {
            site_ref: site.id,
            project: "proj".into(),
            queue: "default".into(),
            num_nodes: 4,
            wall_time_min: 60,
            job_mode: "script".into(),
            filter_tags: BTreeMap::new(),
        },
    )
    .unwrap();

    let queued = jobctl_engine::batch_jobs::update(
        &engine,
        &owner,
        &bj.id,
        BatchJobPatch {
            state: Some(jobctl_core::BatchJobState::Queued),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(queued.state, jobctl_core::BatchJobState::Queued);

    // Once queued, a drifting wall_time_min write without revert is 409.
    let err = jobctl_engine::batch_jobs::update(
        &engine,
        &owner,
        &bj.id,
        BatchJobPatch {
            frozen: jobctl_core::FrozenFieldsPatch { wall_time_min: Some(45), ..Default::default() },
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, jobctl_engine::EngineError::Conflict(_)));
    assert_eq!(err.kind(), jobctl_core::ErrorKind::Conflict);

    let running = jobctl_engine::batch_jobs::update(
        &engine,
        &owner,
        &bj.id,
        BatchJobPatch {
            state: Some(jobctl_core::BatchJobState::Running),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(running.state, jobctl_core::BatchJobState::Running);

    let err = jobctl_engine::batch_jobs::update(
        &engine,
        &owner,
        &bj.id,
        BatchJobPatch {
            frozen: jobctl_core::FrozenFieldsPatch { wall_time_min: Some(30), ..Default::default() },
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, jobctl_engine::EngineError::Conflict(_)));

    let reverted = jobctl_engine::batch_jobs::update(
        &engine,
        &owner,
        &bj.id,
        BatchJobPatch {
            frozen: jobctl_core::FrozenFieldsPatch { wall_time_min: Some(30), ..Default::default() },
            revert: true,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(reverted.wall_time_min, 60, "server value wins, not the reverting client's stale 30");
}

#[test]
fn s5_child_becomes_ready_once_its_only_parent_finishes() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_in(dir.path(), "s5");
    let owner = owner("u1");
    let site = create_site(&engine, &owner, "theta", "/projects/foo");
    let app = create_app(
        &engine,
        &owner,
        "nw-opt",
        vec![jobctl_core::AppBackend {
            site_ref: site.id,
            class_name: "nwchem.GeomOpt".into(),
            site_hostname: String::new(),
            site_path: String::new(),
        }],
        vec![],
    );

    let parent = create_childless_job(&engine, &owner, &app.id, "p");
    let mut parents = BTreeSet::new();
    parents.insert(parent.id.clone());
    let child = create_job_with_parents(&engine, &owner, &app.id, "c", parents);
    assert_eq!(child.state, JobState::AwaitingParents);

    let chain = [
        JobState::Preprocessed,
        JobState::Running,
        JobState::RunDone,
        JobState::StagedOut,
        JobState::JobFinished,
    ];
    let mut current = parent;
    for to in chain {
        let updated = jobctl_engine::jobs::bulk_update(
            &engine,
            &owner,
            vec![(current.id.clone(), JobPatch { state: Some(to), ..Default::default() })],
        )
        .unwrap();
        current = updated.into_iter().next().unwrap();
    }
    assert_eq!(current.state, JobState::JobFinished);

    let child_after = engine.with_state(|state| state.get_job(child.id.as_str()).cloned().unwrap());
    assert_eq!(child_after.state, JobState::Ready);
    let events = engine.with_state(|state| {
        state
            .events_for_job(child.id.as_str())
            .into_iter()
            .map(|e| e.to_state)
            .collect::<Vec<_>>()
    });
    assert_eq!(events.last(), Some(&JobState::Ready));
}

#[test]
fn s6_closing_a_session_releases_its_jobs_without_a_state_change() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_in(dir.path(), "s6");
    let owner = owner("u1");
    let site = create_site(&engine, &owner, "theta", "/projects/foo");
    let app = create_app(
        &engine,
        &owner,
        "nw-opt",
        vec![jobctl_core::AppBackend {
            site_ref: site.id.clone(),
            class_name: "nwchem.GeomOpt".into(),
            site_hostname: String::new(),
            site_path: String::new(),
        }],
        vec![],
    );
    create_childless_job(&engine, &owner, &app.id, "w0");

    let session = jobctl_engine::sessions::open(
        &engine,
        &owner,
        SessionOpenSpec { site_ref: site.id, batch_job_ref: None },
    )
    .unwrap();
    let leased = jobctl_engine::sessions::acquire(
        &engine,
        &owner,
        &session.id,
        AcquireSpec {
            states: vec![JobState::StagedIn],
            max_num_acquire: 10,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(leased.len(), 1);
    let job_id = leased[0].id.clone();
    let events_before = engine.with_state(|state| state.events_for_job(job_id.as_str()).len());

    jobctl_engine::sessions::close(&engine, &owner, &session.id).unwrap();

    let after = engine.with_state(|state| state.get_job(job_id.as_str()).cloned().unwrap());
    assert_eq!(after.state, JobState::StagedIn, "release must not change job state");
    assert_eq!(after.lock_status(), LockStatus::Unlocked);
    assert!(after.session_ref.is_none());
    let events_after = engine.with_state(|state| state.events_for_job(job_id.as_str()).len());
    assert_eq!(events_after, events_before, "release must not emit a LogEvent");
}
