// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! BatchJob filter/order/paginate (§4.1).

use std::collections::BTreeMap;

use jobctl_core::{BatchJob, BatchJobState, OrderKey, SiteId, UserId};
use jobctl_storage::MaterializedState;
use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::order::sort_by_keys;
use crate::page::{paginate, Page, Paginator};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchJobFilter {
    pub site_id_in: Option<Vec<SiteId>>,
    pub state_in: Option<Vec<BatchJobState>>,
    pub scheduler_id: Option<i64>,
    #[serde(default)]
    pub filter_tags_superset: BTreeMap<String, String>,
}

impl BatchJobFilter {
    fn matches(&self, bj: &BatchJob) -> bool {
        if let Some(sites) = &self.site_id_in {
            if !sites.contains(&bj.site_ref) {
                return false;
            }
        }
        if let Some(states) = &self.state_in {
            if !states.contains(&bj.state) {
                return false;
            }
        }
        if let Some(sid) = self.scheduler_id {
            if bj.scheduler_id != Some(sid) {
                return false;
            }
        }
        if !self
            .filter_tags_superset
            .iter()
            .all(|(k, v)| bj.filter_tags.get(k) == Some(v))
        {
            return false;
        }
        true
    }
}

fn field_cmp(field: &str, a: &BatchJob, b: &BatchJob) -> Option<std::cmp::Ordering> {
    use std::cmp::Ordering;
    Some(match field {
        "id" => a.id.cmp(&b.id),
        "state" => format!("{:?}", a.state).cmp(&format!("{:?}", b.state)),
        "scheduler_id" => a.scheduler_id.cmp(&b.scheduler_id),
        _ => return Option::<Ordering>::None,
    })
}

fn scan(state: &MaterializedState, owner_id: &UserId, filter: &BatchJobFilter) -> Vec<BatchJob> {
    state
        .batch_jobs
        .values()
        .filter(|bj| &bj.owner_id == owner_id)
        .filter(|bj| filter.matches(bj))
        .cloned()
        .collect()
}

fn ordered(mut items: Vec<BatchJob>, order_by: &[OrderKey]) -> Vec<BatchJob> {
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

pub fn list(
    state: &MaterializedState,
    owner_id: &UserId,
    filter: &BatchJobFilter,
    order_by: &[OrderKey],
    paginator: Paginator,
) -> Page<BatchJob> {
    paginate(ordered(scan(state, owner_id, filter), order_by), paginator)
}

pub fn count(state: &MaterializedState, owner_id: &UserId, filter: &BatchJobFilter) -> usize {
    scan(state, owner_id, filter).len()
}

pub fn get(
    state: &MaterializedState,
    owner_id: &UserId,
    filter: &BatchJobFilter,
) -> Result<BatchJob, QueryError> {
    crate::page::get_one(scan(state, owner_id, filter))
}
