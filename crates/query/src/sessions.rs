// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session filter/order/paginate (§4.1.1, ADDED): needed by the acquisition
//! engine's own housekeeping and by an operator inspecting live leases.

use chrono::{DateTime, Duration, Utc};
use jobctl_core::{BatchJobId, OrderKey, Session, SessionId, SiteId, UserId};
use jobctl_storage::MaterializedState;
use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::order::sort_by_keys;
use crate::page::{paginate, Page, Paginator};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionFilter {
    pub id_in: Option<Vec<SessionId>>,
    pub site_id: Option<SiteId>,
    pub batch_job_id: Option<BatchJobId>,
    /// `Some(true)`/`Some(false)` restricts to expired/live sessions given
    /// the `now`/`expiry` passed to [`list`]; `None` applies no restriction.
    pub expired: Option<bool>,
}

impl SessionFilter {
    fn matches(&self, session: &Session, now: DateTime<Utc>, expiry: Duration) -> bool {
        if let Some(ids) = &self.id_in {
            if !ids.contains(&session.id) {
                return false;
            }
        }
        if let Some(site_id) = &self.site_id {
            if session.site_ref != *site_id {
                return false;
            }
        }
        if let Some(bj) = &self.batch_job_id {
            if session.batch_job_ref.as_ref() != Some(bj) {
                return false;
            }
        }
        if let Some(want_expired) = self.expired {
            if session.is_expired(now, expiry) != want_expired {
                return false;
            }
        }
        true
    }
}

fn field_cmp(field: &str, a: &Session, b: &Session) -> Option<std::cmp::Ordering> {
    use std::cmp::Ordering;
    Some(match field {
        "id" => a.id.cmp(&b.id),
        "heartbeat" => a.heartbeat.cmp(&b.heartbeat),
        _ => return Option::<Ordering>::None,
    })
}

fn scan(
    state: &MaterializedState,
    owner_id: &UserId,
    filter: &SessionFilter,
    now: DateTime<Utc>,
    expiry: Duration,
) -> Vec<Session> {
    state
        .sessions
        .values()
        .filter(|s| &s.owner_id == owner_id)
        .filter(|s| filter.matches(s, now, expiry))
        .cloned()
        .collect()
}

fn ordered(mut items: Vec<Session>, order_by: &[OrderKey]) -> Vec<Session> {
    let keys: Vec<OrderKey> = if order_by.is_empty() {
        vec![OrderKey {
            field: "id".into(),
            descending: false,
        }]
    } else {
        order_by.to_vec()
    };
    sort_by_keys(&mut items, &keys, field_cmp);
    items
}

#[allow(clippy::too_many_arguments)]
pub fn list(
    state: &MaterializedState,
    owner_id: &UserId,
    filter: &SessionFilter,
    order_by: &[OrderKey],
    paginator: Paginator,
    now: DateTime<Utc>,
    expiry: Duration,
) -> Page<Session> {
    paginate(ordered(scan(state, owner_id, filter, now, expiry), order_by), paginator)
}

pub fn count(
    state: &MaterializedState,
    owner_id: &UserId,
    filter: &SessionFilter,
    now: DateTime<Utc>,
    expiry: Duration,
) -> usize {
    scan(state, owner_id, filter, now, expiry).len()
}

pub fn get(
    state: &MaterializedState,
    owner_id: &UserId,
    filter: &SessionFilter,
    now: DateTime<Utc>,
    expiry: Duration,
) -> Result<Session, QueryError> {
    crate::page::get_one(scan(state, owner_id, filter, now, expiry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn session(id: &str, owner: &str, heartbeat: &str) -> Session {
        Session {
            id: SessionId::new(id),
            owner_id: UserId::new(owner),
            site_ref: SiteId::new("site-1"),
            batch_job_ref: None,
            heartbeat: heartbeat.parse().unwrap(),
            acquired_job_refs: BTreeSet::new(),
        }
    }

    #[test]
    fn expired_predicate_uses_now_and_expiry() {
        let mut state = MaterializedState::default();
        for s in [
            session("sess-1", "u1", "2026-01-01T00:00:00Z"),
            session("sess-2", "u1", "2026-01-01T00:09:00Z"),
        ] {
            state.sessions.insert(s.id.as_str().to_string(), s);
        }
        let now: DateTime<Utc> = "2026-01-01T00:10:00Z".parse().unwrap();
        let expiry = Duration::minutes(5);
        let filter = SessionFilter {
            expired: Some(true),
            ..Default::default()
        };
        let page = list(&state, &UserId::new("u1"), &filter, &[], Paginator::new(0, 100), now, expiry);
        assert_eq!(page.count, 1);
        assert_eq!(page.results[0].id.as_str(), "sess-1");
    }
}
