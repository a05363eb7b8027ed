// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the workspace-level behavioral tests: a disk-backed
//! `Engine` wired the same way `jobctl-daemon`'s `build_engine` wires one
//! (deterministic clock/id-gen substituted for the production pair), plus
//! the handful of entity builders each scenario needs.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};

use jobctl_core::{FakeClock, SequentialIdGen, UserId};
use jobctl_engine::{Engine, EngineConfig};
use jobctl_storage::{MaterializedState, Wal};

pub type TestEngine = Engine<FakeClock, SequentialIdGen>;

pub const EPOCH: &str = "2026-01-01T00:00:00Z";

/// A fresh engine backed by a real on-disk WAL in its own temp directory,
/// an id prefix distinguishing which fixture created which row, and a
/// `FakeClock` so heartbeat/expiry math is deterministic.
pub fn engine_in(dir: &std::path::Path, id_prefix: &str) -> TestEngine {
    let wal = Wal::open(&dir.join("events.wal"), 0).expect("open wal");
    Engine::new(
        MaterializedState::default(),
        wal,
        FakeClock::new(EPOCH.parse().expect("valid literal timestamp")),
        SequentialIdGen::new(id_prefix),
        EngineConfig::default(),
    )
}

pub fn owner(name: &str) -> UserId {
    UserId::new(name)
}

pub fn create_site(engine: &TestEngine, owner_id: &UserId, hostname: &str, path: &str) -> jobctl_core::Site {
    jobctl_engine::sites::create(
        engine,
        owner_id,
        jobctl_engine::sites::SiteCreateSpec {
            hostname: hostname.into(),
            path: path.into(),
        },
    )
    .expect("create site")
}

pub fn create_app(
    engine: &TestEngine,
    owner_id: &UserId,
    name: &str,
    backends: Vec<jobctl_core::AppBackend>,
    parameters: Vec<&str>,
) -> jobctl_core::App {
    jobctl_engine::apps::create(
        engine,
        owner_id,
        jobctl_engine::apps::AppCreateSpec {
            name: name.into(),
            backends,
            parameters: parameters.into_iter().map(str::to_string).collect(),
        },
    )
    .expect("create app")
}

pub fn create_job(
    engine: &TestEngine,
    owner_id: &UserId,
    app_id: &jobctl_core::AppId,
    workdir: &str,
    parameters: BTreeMap<String, String>,
    resources: jobctl_core::ResourceHints,
) -> jobctl_core::Job {
    jobctl_engine::jobs::bulk_create(
        engine,
        owner_id,
        vec![jobctl_engine::jobs::JobCreateSpec {
            app_ref: app_id.clone(),
            workdir: workdir.into(),
            parameters,
            resources,
            ..Default::default()
        }],
    )
    .expect("create job")
    .remove(0)
}

pub fn create_childless_job(engine: &TestEngine, owner_id: &UserId, app_id: &jobctl_core::AppId, workdir: &str) -> jobctl_core::Job {
    create_job(engine, owner_id, app_id, workdir, BTreeMap::new(), jobctl_core::ResourceHints::default())
}

pub fn create_job_with_parents(
    engine: &TestEngine,
    owner_id: &UserId,
    app_id: &jobctl_core::AppId,
    workdir: &str,
    parents: BTreeSet<jobctl_core::JobId>,
) -> jobctl_core::Job {
    jobctl_engine::jobs::bulk_create(
        engine,
        owner_id,
        vec![jobctl_engine::jobs::JobCreateSpec {
            app_ref: app_id.clone(),
            workdir: workdir.into(),
            parents,
            ..Default::default()
        }],
    )
    .expect("create job")
    .remove(0)
}
