// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test-only entity builders, gated behind the `test-support` feature so
//! downstream crates' dev-dependencies can share one fixture vocabulary
//! instead of re-deriving sensible defaults for every entity in every
//! test module.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use crate::app::{App, AppBackend};
use crate::batch_job::{BatchJob, BatchJobState};
use crate::ids::{AppId, BatchJobId, JobId, SessionId, SiteId, UserId};
use crate::job::{Job, JobState, ResourceHints};
use crate::session::Session;
use crate::site::{Site, SiteStatus};

fn epoch() -> DateTime<Utc> {
    "2026-01-01T00:00:00Z".parse().expect("valid literal timestamp")
}

pub fn site(id: &str, owner: &str, hostname: &str, path: &str) -> Site {
    Site {
        id: SiteId::new(id),
        owner_id: UserId::new(owner),
        hostname: hostname.into(),
        path: path.into(),
        status: SiteStatus::default(),
        last_refresh: epoch(),
    }
}

pub fn app(id: &str, owner: &str, name: &str, backends: Vec<AppBackend>, parameters: Vec<&str>) -> App {
    App {
        id: AppId::new(id),
        owner_id: UserId::new(owner),
        name: name.into(),
        backends,
        parameters: parameters.into_iter().map(str::to_string).collect(),
    }
}

pub fn backend(site_id: &str, class_name: &str) -> AppBackend {
    AppBackend {
        site_ref: SiteId::new(site_id),
        class_name: class_name.into(),
        site_hostname: String::new(),
        site_path: String::new(),
    }
}

pub fn job(id: &str, owner: &str, app_id: &str, workdir: &str) -> Job {
    Job {
        id: JobId::new(id),
        owner_id: UserId::new(owner),
        app_ref: AppId::new(app_id),
        workdir: workdir.into(),
        parameters: BTreeMap::new(),
        tags: BTreeMap::new(),
        resources: ResourceHints::default(),
        parents: BTreeSet::new(),
        state: JobState::Created,
        state_message: String::new(),
        state_timestamp: None,
        last_update: epoch(),
        batch_job_ref: None,
        session_ref: None,
        return_code: None,
        batch_job_bound_by_session: false,
        data: serde_json::Value::Null,
    }
}

pub fn batch_job(id: &str, owner: &str, site_id: &str) -> BatchJob {
    BatchJob {
        id: BatchJobId::new(id),
        owner_id: UserId::new(owner),
        site_ref: SiteId::new(site_id),
        project: "proj".into(),
        queue: "default".into(),
        num_nodes: 1,
        wall_time_min: 60,
        job_mode: "script".into(),
        filter_tags: BTreeMap::new(),
        scheduler_id: None,
        state: BatchJobState::PendingSubmission,
        status_info: String::new(),
        start_time: None,
        end_time: None,
        revert: false,
    }
}

pub fn session(id: &str, owner: &str, site_id: &str) -> Session {
    Session {
        id: SessionId::new(id),
        owner_id: UserId::new(owner),
        site_ref: SiteId::new(site_id),
        batch_job_ref: None,
        heartbeat: epoch(),
        acquired_job_refs: BTreeSet::new(),
    }
}
