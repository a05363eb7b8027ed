// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LogEvent filter/order/paginate (§4.1). Events are append-only and owner
//! scoped indirectly through the Job they belong to.

use chrono::{DateTime, Utc};
use jobctl_core::{JobId, JobState, LogEvent, OrderKey, UserId};
use jobctl_storage::MaterializedState;
use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::order::sort_by_keys;
use crate::page::{paginate, Page, Paginator};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    pub job_id_in: Option<Vec<JobId>>,
    pub to_state_in: Option<Vec<JobState>>,
    pub from_state_in: Option<Vec<JobState>>,
    pub message_contains: Option<String>,
    pub timestamp_ge: Option<DateTime<Utc>>,
    pub timestamp_le: Option<DateTime<Utc>>,
}

impl EventFilter {
    fn matches(&self, event: &LogEvent) -> bool {
        if let Some(ids) = &self.job_id_in {
            if !ids.contains(&event.job_ref) {
                return false;
            }
        }
        if let Some(states) = &self.to_state_in {
            if !states.contains(&event.to_state) {
                return false;
            }
        }
        if let Some(states) = &self.from_state_in {
            match event.from_state {
                Some(s) if states.contains(&s) => {}
                _ => return false,
            }
        }
        if let Some(needle) = &self.message_contains {
            if !event.message.contains(needle.as_str()) {
                return false;
            }
        }
        if let Some(ge) = self.timestamp_ge {
            if event.timestamp < ge {
                return false;
            }
        }
        if let Some(le) = self.timestamp_le {
            if event.timestamp > le {
                return false;
            }
        }
        true
    }
}

fn field_cmp(field: &str, a: &LogEvent, b: &LogEvent) -> Option<std::cmp::Ordering> {
    use std::cmp::Ordering;
    Some(match field {
        "timestamp" => a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)),
        "id" => a.id.cmp(&b.id),
        "job_id" => a.job_ref.cmp(&b.job_ref),
        _ => return Option::<Ordering>::None,
    })
}

/// Events are owned by whoever owns the job they belong to; a job's owner
/// is looked up in `state.jobs` to scope visibility (§8 invariant 3). An
/// event whose job has since been deleted is invisible to everyone — it
/// cannot be attributed to an owner, so it is excluded rather than leaked.
fn scan(state: &MaterializedState, owner_id: &UserId, filter: &EventFilter) -> Vec<LogEvent> {
    state
        .log_event_order
        .iter()
        .filter_map(|id| state.log_events.get(id))
        .filter(|e| {
            state
                .get_job(e.job_ref.as_str())
                .is_some_and(|j| &j.owner_id == owner_id)
        })
        .filter(|e| filter.matches(e))
        .cloned()
        .collect()
}

fn ordered(mut items: Vec<LogEvent>, order_by: &[OrderKey]) -> Vec<LogEvent> {
    let keys: Vec<OrderKey> = if order_by.is_empty() {
        vec![OrderKey {
            field: "timestamp".into(),
            descending: false,
        }]
    } else {
        order_by.to_vec()
    };
    sort_by_keys(&mut items, &keys, field_cmp);
    items
}

pub fn list(
    state: &MaterializedState,
    owner_id: &UserId,
    filter: &EventFilter,
    order_by: &[OrderKey],
    paginator: Paginator,
) -> Page<LogEvent> {
    paginate(ordered(scan(state, owner_id, filter), order_by), paginator)
}

pub fn count(state: &MaterializedState, owner_id: &UserId, filter: &EventFilter) -> usize {
    scan(state, owner_id, filter).len()
}

pub fn get(
    state: &MaterializedState,
    owner_id: &UserId,
    filter: &EventFilter,
) -> Result<LogEvent, QueryError> {
    crate::page::get_one(scan(state, owner_id, filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobctl_core::{AppId, Job, LogEventId, ResourceHints};
    use std::collections::BTreeMap;

    fn job(id: &str, owner: &str) -> Job {
        Job {
            id: JobId::new(id),
            owner_id: UserId::new(owner),
            app_ref: AppId::new("app-1"),
            workdir: "wd".into(),
            parameters: BTreeMap::new(),
            tags: BTreeMap::new(),
            resources: ResourceHints::default(),
            parents: Default::default(),
            state: JobState::Ready,
            state_message: String::new(),
            state_timestamp: None,
            last_update: "2026-01-01T00:00:00Z".parse().unwrap(),
            batch_job_ref: None,
            session_ref: None,
            return_code: None,
            batch_job_bound_by_session: false,
            data: serde_json::Value::Null,
        }
    }

    fn event(id: &str, job_ref: &str, to: JobState, ts: &str) -> LogEvent {
        LogEvent {
            id: LogEventId::new(id),
            job_ref: JobId::new(job_ref),
            timestamp: ts.parse().unwrap(),
            from_state: None,
            to_state: to,
            message: String::new(),
        }
    }

    fn seeded() -> MaterializedState {
        let mut state = MaterializedState::default();
        let j = job("job-1", "u1");
        state.jobs.insert(j.id.as_str().to_string(), j);
        let other = job("job-2", "u2");
        state.jobs.insert(other.id.as_str().to_string(), other);

        for (id, job_ref, to, ts) in [
            ("evt-2", "job-1", JobState::Ready, "2026-01-01T00:00:02Z"),
            ("evt-1", "job-1", JobState::StagedIn, "2026-01-01T00:00:01Z"),
            ("evt-3", "job-2", JobState::StagedIn, "2026-01-01T00:00:03Z"),
        ] {
            let ev = event(id, job_ref, to, ts);
            state.log_events.insert(ev.id.as_str().to_string(), ev);
            state.log_event_order.push(id.to_string());
        }
        state
    }

    #[test]
    fn owner_isolation_hides_other_owners_events_via_job_lookup() {
        let state = seeded();
        let page = list(&state, &UserId::new("u1"), &EventFilter::default(), &[], Paginator::new(0, 100));
        assert_eq!(page.count, 2);
    }

    #[test]
    fn default_order_is_timestamp_ascending_regardless_of_commit_order() {
        let state = seeded();
        let page = list(&state, &UserId::new("u1"), &EventFilter::default(), &[], Paginator::new(0, 100));
        let ids: Vec<_> = page.results.iter().map(|e| e.id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["evt-1", "evt-2"]);
    }
}
