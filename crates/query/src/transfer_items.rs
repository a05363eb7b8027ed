// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TransferItem filter/order/paginate backing `/transfers/` (§6). Not named
//! in §4.1's predicate table (only jobs/events/batch_jobs are); a minimal
//! by-job filter is enough to back the one list route §6 grants it.

use jobctl_core::{JobId, OrderKey, TransferDirection, TransferItem, TransferItemId, UserId};
use jobctl_storage::MaterializedState;
use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::order::sort_by_keys;
use crate::page::{paginate, Page, Paginator};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferItemFilter {
    pub id_in: Option<Vec<TransferItemId>>,
    pub job_id_in: Option<Vec<JobId>>,
    pub direction: Option<TransferDirection>,
}

impl TransferItemFilter {
    fn matches(&self, item: &TransferItem) -> bool {
        if let Some(ids) = &self.id_in {
            if !ids.contains(&item.id) {
                return false;
            }
        }
        if let Some(jobs) = &self.job_id_in {
            if !jobs.contains(&item.job_ref) {
                return false;
            }
        }
        if let Some(dir) = self.direction {
            if item.direction != dir {
                return false;
            }
        }
        true
    }
}

fn field_cmp(field: &str, a: &TransferItem, b: &TransferItem) -> Option<std::cmp::Ordering> {
    use std::cmp::Ordering;
    Some(match field {
        "id" => a.id.cmp(&b.id),
        _ => return Option::<Ordering>::None,
    })
}

/// Owned transitively through the parent Job (TransferItem carries no
/// `owner_id` of its own — §3 describes it as a child of Job).
fn scan(state: &MaterializedState, owner_id: &UserId, filter: &TransferItemFilter) -> Vec<TransferItem> {
    state
        .transfer_items
        .values()
        .filter(|t| {
            state
                .get_job(t.job_ref.as_str())
                .is_some_and(|j| &j.owner_id == owner_id)
        })
        .filter(|t| filter.matches(t))
        .cloned()
        .collect()
}

fn ordered(mut items: Vec<TransferItem>, order_by: &[OrderKey]) -> Vec<TransferItem> {
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
    filter: &TransferItemFilter,
    order_by: &[OrderKey],
    paginator: Paginator,
) -> Page<TransferItem> {
    paginate(ordered(scan(state, owner_id, filter), order_by), paginator)
}

pub fn count(state: &MaterializedState, owner_id: &UserId, filter: &TransferItemFilter) -> usize {
    scan(state, owner_id, filter).len()
}

pub fn get(
    state: &MaterializedState,
    owner_id: &UserId,
    filter: &TransferItemFilter,
) -> Result<TransferItem, QueryError> {
    crate::page::get_one(scan(state, owner_id, filter))
}
