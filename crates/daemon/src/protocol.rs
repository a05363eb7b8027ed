// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The typed request/response protocol an (out-of-scope, §1) transport
//! binds to (SPEC_FULL §6.1). One `Request` variant per route in §6, one
//! success `Response` variant per shape, and a shared `Response::Error` for
//! every §7 kind — in the shape of the reference daemon's own
//! `protocol_types`/listener split: the wire enum lives here in
//! `jobctl-daemon`, never in `jobctl-core` or `jobctl-engine`.

use jobctl_core::{
    AppId, BatchJobId, ErrorKind, Job, JobId, LogEvent, OrderKey, Session, SessionId, Site,
    SiteId, TransferItemId, UserId,
};
use jobctl_core::{App, BatchJob, TransferItem};
use jobctl_engine::apps::{AppCreateSpec, AppPatch};
use jobctl_engine::batch_jobs::{BatchJobCreateSpec, BatchJobPatch};
use jobctl_engine::jobs::{JobCreateSpec, JobPatch};
use jobctl_engine::sessions::SessionOpenSpec;
use jobctl_engine::sites::SiteCreateSpec;
use jobctl_engine::sites::SitePatch;
use jobctl_engine::transfer_items::TransferItemPatch;
use jobctl_query::apps::AppFilter;
use jobctl_query::batch_jobs::BatchJobFilter;
use jobctl_query::events::EventFilter;
use jobctl_query::jobs::JobFilter;
use jobctl_query::sessions::SessionFilter;
use jobctl_query::sites::SiteFilter;
use jobctl_query::transfer_items::TransferItemFilter;
use jobctl_query::Paginator;
use serde::{Deserialize, Serialize};

use jobctl_core::{AcquireSpec, BackfillWindow};
use std::collections::BTreeMap;

/// A list query shared by every `*List` request variant: owner scope is
/// carried on the request, not the filter (§6, "owner scoped via auth
/// middleware" — the middleware is out of scope, but it must supply
/// `owner_id` on every request per §1/§6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListArgs {
    #[serde(default)]
    pub order_by: Vec<String>,
    #[serde(default)]
    pub paginator: Paginator,
}

impl ListArgs {
    pub fn order_keys(&self) -> Vec<OrderKey> {
        jobctl_query::order::parse_order_by(&self.order_by)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum Request {
    // -- /sites/ --
    SitesList { owner_id: UserId, filter: SiteFilter, args: ListArgs },
    SitesCreate { owner_id: UserId, spec: SiteCreateSpec },
    SitesGet { owner_id: UserId, id: SiteId },
    SitesUpdate { owner_id: UserId, id: SiteId, patch: SitePatch },
    SitesDelete { owner_id: UserId, id: SiteId },
    SitesReportBackfill {
        owner_id: UserId,
        id: SiteId,
        queue_windows: BTreeMap<String, Vec<BackfillWindow>>,
    },

    // -- /apps/ --
    AppsList { owner_id: UserId, filter: AppFilter, args: ListArgs },
    AppsCreate { owner_id: UserId, spec: AppCreateSpec },
    AppsGet { owner_id: UserId, id: AppId },
    AppsUpdate { owner_id: UserId, id: AppId, patch: AppPatch },
    AppsDelete { owner_id: UserId, id: AppId },
    AppsMerge { owner_id: UserId, ids: Vec<AppId> },

    // -- /jobs/ --
    JobsList { owner_id: UserId, filter: JobFilter, args: ListArgs },
    JobsBulkCreate { owner_id: UserId, specs: Vec<JobCreateSpec> },
    JobsGet { owner_id: UserId, id: JobId },
    /// `PATCH /jobs/`: bulk update by id list (§4.2).
    JobsBulkUpdate { owner_id: UserId, patches: Vec<(JobId, JobPatch)> },
    /// `PUT /jobs/`: update-by-query using the same filter surface (§4.2, §6).
    JobsUpdateByQuery { owner_id: UserId, filter: JobFilter, patch: JobPatch },
    /// `DELETE /jobs/`: delete-by-query (§6).
    JobsDeleteByQuery { owner_id: UserId, filter: JobFilter },

    // -- /events/ (GET only, §6) --
    EventsList { owner_id: UserId, filter: EventFilter, args: ListArgs },

    // -- /batch-jobs/ --
    BatchJobsList { owner_id: UserId, filter: BatchJobFilter, args: ListArgs },
    BatchJobsCreate { owner_id: UserId, spec: BatchJobCreateSpec },
    BatchJobsGet { owner_id: UserId, id: BatchJobId },
    BatchJobsUpdate { owner_id: UserId, id: BatchJobId, patch: BatchJobPatch },
    BatchJobsDelete { owner_id: UserId, id: BatchJobId },
    /// Always rejected with `NotImplemented` (§4.5, §6): no collection `DELETE`.
    BatchJobsDeleteByQuery { owner_id: UserId, filter: BatchJobFilter },

    // -- /sessions/ --
    SessionsOpen { owner_id: UserId, spec: SessionOpenSpec },
    SessionsList { owner_id: UserId, filter: SessionFilter, args: ListArgs },
    SessionsGet { owner_id: UserId, id: SessionId },
    SessionsClose { owner_id: UserId, id: SessionId },
    SessionsTick { owner_id: UserId, id: SessionId },
    SessionsAcquire { owner_id: UserId, id: SessionId, spec: AcquireSpec },

    // -- /transfers/ --
    TransfersList { owner_id: UserId, filter: TransferItemFilter, args: ListArgs },
    TransfersGet { owner_id: UserId, id: TransferItemId },
    TransfersUpdate { owner_id: UserId, id: TransferItemId, patch: TransferItemPatch },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result")]
pub enum Response {
    Site(Site),
    Sites(jobctl_query::Page<Site>),
    App(App),
    Apps(jobctl_query::Page<App>),
    Job(Job),
    Jobs(jobctl_query::Page<Job>),
    JobsCreated(Vec<Job>),
    JobsUpdated(Vec<Job>),
    JobIds(Vec<JobId>),
    Event(LogEvent),
    Events(jobctl_query::Page<LogEvent>),
    BatchJob(BatchJob),
    BatchJobs(jobctl_query::Page<BatchJob>),
    Session(Session),
    Sessions(jobctl_query::Page<Session>),
    AcquiredJobs(Vec<Job>),
    TransferItem(TransferItem),
    TransferItems(jobctl_query::Page<TransferItem>),
    Deleted,
    Error { kind: ErrorKind, detail: String },
}

impl From<jobctl_engine::EngineError> for Response {
    fn from(err: jobctl_engine::EngineError) -> Self {
        Response::Error {
            kind: err.kind(),
            detail: err.to_string(),
        }
    }
}

impl From<jobctl_query::QueryError> for Response {
    fn from(err: jobctl_query::QueryError) -> Self {
        let engine_err: jobctl_engine::EngineError = err.into();
        engine_err.into()
    }
}
