// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The event log schema the WAL persists and `MaterializedState` replays
//! (§5.1). Every variant carries the already-computed new value of
//! whatever it touches — the engine is where business logic (state-machine
//! validation, bin-packing, freeze checks) happens; events are facts, and
//! replaying one twice must be a no-op (§5.1's idempotency discipline).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::app::App;
use crate::batch_job::BatchJob;
use crate::ids::{AppId, BatchJobId, JobId, SessionId, SiteId, TransferItemId};
use crate::job::Job;
use crate::log_event::LogEvent;
use crate::session::Session;
use crate::site::Site;
use crate::transfer_item::TransferItem;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SiteCreated { site: Site },
    SiteReplaced { site: Site },
    SiteDeleted { id: SiteId },

    AppCreated { app: App },
    AppReplaced { app: App },
    AppDeleted { id: AppId },
    /// `surviving` carries the merged backends/parameters; `removed_ids` are
    /// dropped from state; `rewritten_jobs` are the full post-rewrite
    /// snapshots of any job whose `app_ref` pointed at a removed app (§4.2.1).
    AppsMerged {
        surviving: App,
        removed_ids: Vec<AppId>,
        rewritten_jobs: Vec<Job>,
    },

    BatchJobCreated { batch_job: BatchJob },
    BatchJobReplaced { batch_job: BatchJob },
    BatchJobDeleted { id: BatchJobId },

    /// Creation always emits at least one LogEvent (`∅ → STAGED_IN`), and a
    /// second (`STAGED_IN → READY`) when the job has no parents (§3, §4.3).
    JobCreated {
        job: Job,
        transfer_items: Vec<TransferItem>,
        log_events: Vec<LogEvent>,
    },
    /// The generic "N jobs now look like this" event used by bulk_update,
    /// update_by_query, acquire, child-readiness recompute, and session
    /// release/expiry alike. `log_events` holds any state-transition
    /// records produced alongside (empty for a pure lock/field change).
    JobsReplaced {
        jobs: Vec<Job>,
        log_events: Vec<LogEvent>,
    },
    JobsDeleted { ids: Vec<JobId> },

    TransferItemReplaced { item: TransferItem },
    TransferItemsDeleted { ids: Vec<TransferItemId> },

    SessionOpened { session: Session },
    SessionTicked { id: SessionId, heartbeat: chrono::DateTime<chrono::Utc> },
    /// Union `job_refs` into the session's `acquired_job_refs` (§3, §4.4).
    /// A set union so replaying twice is a no-op.
    SessionJobsAcquired { id: SessionId, job_refs: BTreeSet<JobId> },
    /// Session row removed (explicit close or expiry sweep); any jobs it
    /// released travel alongside as a `JobsReplaced` event in the same
    /// transaction, not nested in this one, so replay order stays flat.
    SessionClosed { id: SessionId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_round_trips_through_json_with_tagged_variant() {
        let ev = Event::SessionClosed {
            id: crate::ids::SessionId::new("sess-1"),
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains("\"type\":\"SessionClosed\""));
        let back: Event = serde_json::from_str(&json).unwrap();
        match back {
            Event::SessionClosed { id } => assert_eq!(id.as_str(), "sess-1"),
            _ => panic!("wrong variant"),
        }
    }
}
