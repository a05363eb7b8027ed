// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Glue a decoded [`Request`] to the matching `jobctl-engine`/`jobctl-query`
//! service call and encode its outcome back into a [`Response`] (SPEC_FULL
//! §6.1). A transport (HTTP, Unix socket, anything) owns deserializing the
//! wire bytes into a `Request` and this crate's [`dispatch`] into a
//! `Response`; the core itself never sees a socket.

use jobctl_core::{Clock, IdGen};
use jobctl_engine::Engine;
use jobctl_query::page::get_one;
use jobctl_query::Paginator;

use crate::protocol::{Request, Response};

/// Run one request against `engine`, mapping any `EngineError`/`QueryError`
/// into `Response::Error` rather than ever propagating a Rust error across
/// the wire boundary.
pub fn dispatch<C: Clock, G: IdGen>(engine: &Engine<C, G>, request: Request) -> Response {
    match request {
        Request::SitesList { owner_id, filter, args } => engine.with_state(|state| {
            Response::Sites(jobctl_query::sites::list(
                state,
                &owner_id,
                &filter,
                &args.order_keys(),
                clamp(args.paginator, engine),
            ))
        }),
        Request::SitesCreate { owner_id, spec } => {
            match jobctl_engine::sites::create(engine, &owner_id, spec) {
                Ok(site) => Response::Site(site),
                Err(e) => e.into(),
            }
        }
        Request::SitesGet { owner_id, id } => engine.with_state(|state| {
            let filter = jobctl_query::sites::SiteFilter { id_in: Some(vec![id]), ..Default::default() };
            match jobctl_query::sites::get(state, &owner_id, &filter) {
                Ok(site) => Response::Site(site),
                Err(e) => e.into(),
            }
        }),
        Request::SitesUpdate { owner_id, id, patch } => {
            match jobctl_engine::sites::update(engine, &owner_id, &id, patch) {
                Ok(site) => Response::Site(site),
                Err(e) => e.into(),
            }
        }
        Request::SitesDelete { owner_id, id } => {
            match jobctl_engine::sites::delete(engine, &owner_id, &id) {
                Ok(()) => Response::Deleted,
                Err(e) => e.into(),
            }
        }
        Request::SitesReportBackfill { owner_id, id, queue_windows } => {
            match jobctl_engine::sites::report_backfill(engine, &owner_id, &id, queue_windows) {
                Ok(site) => Response::Site(site),
                Err(e) => e.into(),
            }
        }

        Request::AppsList { owner_id, filter, args } => engine.with_state(|state| {
            Response::Apps(jobctl_query::apps::list(
                state,
                &owner_id,
                &filter,
                &args.order_keys(),
                clamp(args.paginator, engine),
            ))
        }),
        Request::AppsCreate { owner_id, spec } => {
            match jobctl_engine::apps::create(engine, &owner_id, spec) {
                Ok(app) => Response::App(app),
                Err(e) => e.into(),
            }
        }
        Request::AppsGet { owner_id, id } => engine.with_state(|state| {
            let filter = jobctl_query::apps::AppFilter { id_in: Some(vec![id]), ..Default::default() };
            match jobctl_query::apps::get(state, &owner_id, &filter) {
                Ok(app) => Response::App(app),
                Err(e) => e.into(),
            }
        }),
        Request::AppsUpdate { owner_id, id, patch } => {
            match jobctl_engine::apps::update(engine, &owner_id, &id, patch) {
                Ok(app) => Response::App(app),
                Err(e) => e.into(),
            }
        }
        Request::AppsDelete { owner_id, id } => {
            match jobctl_engine::apps::delete(engine, &owner_id, &id) {
                Ok(()) => Response::Deleted,
                Err(e) => e.into(),
            }
        }
        Request::AppsMerge { owner_id, ids } => {
            match jobctl_engine::apps::merge(engine, &owner_id, &ids) {
                Ok(app) => Response::App(app),
                Err(e) => e.into(),
            }
        }

        Request::JobsList { owner_id, filter, args } => engine.with_state(|state| {
            Response::Jobs(jobctl_query::jobs::list(
                state,
                &owner_id,
                &filter,
                &args.order_keys(),
                clamp(args.paginator, engine),
            ))
        }),
        Request::JobsBulkCreate { owner_id, specs } => {
            match jobctl_engine::jobs::bulk_create(engine, &owner_id, specs) {
                Ok(jobs) => Response::JobsCreated(jobs),
                Err(e) => e.into(),
            }
        }
        Request::JobsGet { owner_id, id } => engine.with_state(|state| {
            let filter = jobctl_query::jobs::JobFilter { id_in: Some(vec![id]), ..Default::default() };
            match jobctl_query::jobs::get(state, &owner_id, &filter) {
                Ok(job) => Response::Job(job),
                Err(e) => e.into(),
            }
        }),
        Request::JobsBulkUpdate { owner_id, patches } => {
            match jobctl_engine::jobs::bulk_update(engine, &owner_id, patches) {
                Ok(jobs) => Response::JobsUpdated(jobs),
                Err(e) => e.into(),
            }
        }
        Request::JobsUpdateByQuery { owner_id, filter, patch } => {
            match jobctl_engine::jobs::update_by_query(engine, &owner_id, &filter, patch) {
                Ok(jobs) => Response::JobsUpdated(jobs),
                Err(e) => e.into(),
            }
        }
        Request::JobsDeleteByQuery { owner_id, filter } => {
            match jobctl_engine::jobs::delete_by_query(engine, &owner_id, &filter) {
                Ok(ids) => Response::JobIds(ids),
                Err(e) => e.into(),
            }
        }

        Request::EventsList { owner_id, filter, args } => engine.with_state(|state| {
            Response::Events(jobctl_query::events::list(
                state,
                &owner_id,
                &filter,
                &args.order_keys(),
                clamp(args.paginator, engine),
            ))
        }),

        Request::BatchJobsList { owner_id, filter, args } => engine.with_state(|state| {
            Response::BatchJobs(jobctl_query::batch_jobs::list(
                state,
                &owner_id,
                &filter,
                &args.order_keys(),
                clamp(args.paginator, engine),
            ))
        }),
        Request::BatchJobsCreate { owner_id, spec } => {
            match jobctl_engine::batch_jobs::create(engine, &owner_id, spec) {
                Ok(bj) => Response::BatchJob(bj),
                Err(e) => e.into(),
            }
        }
        Request::BatchJobsGet { owner_id, id } => engine.with_state(|state| {
            // `BatchJobFilter` has no `id_in` (§4.1 lists no per-id predicate for
            // this collection); scan and match directly instead.
            let matches: Vec<_> = state
                .batch_jobs
                .values()
                .filter(|bj| bj.owner_id == owner_id && bj.id == id)
                .cloned()
                .collect();
            match get_one(matches) {
                Ok(bj) => Response::BatchJob(bj),
                Err(e) => e.into(),
            }
        }),
        Request::BatchJobsUpdate { owner_id, id, patch } => {
            match jobctl_engine::batch_jobs::update(engine, &owner_id, &id, patch) {
                Ok(bj) => Response::BatchJob(bj),
                Err(e) => e.into(),
            }
        }
        Request::BatchJobsDelete { owner_id, id } => {
            match jobctl_engine::batch_jobs::delete(engine, &owner_id, &id) {
                Ok(()) => Response::Deleted,
                Err(e) => e.into(),
            }
        }
        Request::BatchJobsDeleteByQuery { owner_id: _, filter: _ } => {
            match jobctl_engine::batch_jobs::delete_by_query(engine) {
                Ok(()) => Response::Deleted,
                Err(e) => e.into(),
            }
        }

        Request::SessionsOpen { owner_id, spec } => {
            match jobctl_engine::sessions::open(engine, &owner_id, spec) {
                Ok(session) => Response::Session(session),
                Err(e) => e.into(),
            }
        }
        Request::SessionsList { owner_id, filter, args } => {
            let now = engine.now();
            let expiry = engine.config.session_expiry;
            engine.with_state(|state| {
                Response::Sessions(jobctl_query::sessions::list(
                    state,
                    &owner_id,
                    &filter,
                    &args.order_keys(),
                    clamp(args.paginator, engine),
                    now,
                    expiry,
                ))
            })
        }
        Request::SessionsGet { owner_id, id } => {
            let now = engine.now();
            let expiry = engine.config.session_expiry;
            engine.with_state(|state| {
                let filter = jobctl_query::sessions::SessionFilter { id_in: Some(vec![id]), ..Default::default() };
                match jobctl_query::sessions::get(state, &owner_id, &filter, now, expiry) {
                    Ok(session) => Response::Session(session),
                    Err(e) => e.into(),
                }
            })
        }
        Request::SessionsClose { owner_id, id } => {
            match jobctl_engine::sessions::close(engine, &owner_id, &id) {
                Ok(_released) => Response::Deleted,
                Err(e) => e.into(),
            }
        }
        Request::SessionsTick { owner_id, id } => {
            match jobctl_engine::sessions::tick(engine, &owner_id, &id) {
                Ok(session) => Response::Session(session),
                Err(e) => e.into(),
            }
        }
        Request::SessionsAcquire { owner_id, id, spec } => {
            match jobctl_engine::sessions::acquire(engine, &owner_id, &id, spec) {
                Ok(jobs) => Response::AcquiredJobs(jobs),
                Err(e) => e.into(),
            }
        }

        Request::TransfersList { owner_id, filter, args } => engine.with_state(|state| {
            Response::TransferItems(jobctl_query::transfer_items::list(
                state,
                &owner_id,
                &filter,
                &args.order_keys(),
                clamp(args.paginator, engine),
            ))
        }),
        Request::TransfersGet { owner_id, id } => engine.with_state(|state| {
            let filter = jobctl_query::transfer_items::TransferItemFilter {
                id_in: Some(vec![id]),
                ..Default::default()
            };
            match jobctl_query::transfer_items::get(state, &owner_id, &filter) {
                Ok(item) => Response::TransferItem(item),
                Err(e) => e.into(),
            }
        }),
        Request::TransfersUpdate { owner_id, id, patch } => {
            match jobctl_engine::transfer_items::update(engine, &owner_id, &id, patch) {
                Ok(item) => Response::TransferItem(item),
                Err(e) => e.into(),
            }
        }
    }
}

/// Clamp a client-proposed page size against the configured maximum (§4.1).
fn clamp<C: Clock, G: IdGen>(paginator: Paginator, engine: &Engine<C, G>) -> Paginator {
    Paginator::new(paginator.offset, paginator.limit.min(engine.config.max_page_size))
}
