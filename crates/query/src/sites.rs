// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Site filter/order/paginate (§4.1.1, ADDED).

use jobctl_core::{OrderKey, Site, SiteId, UserId};
use jobctl_storage::MaterializedState;
use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::order::sort_by_keys;
use crate::page::{paginate, Page, Paginator};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteFilter {
    pub id_in: Option<Vec<SiteId>>,
    pub hostname_contains: Option<String>,
}

impl SiteFilter {
    fn matches(&self, site: &Site) -> bool {
        if let Some(ids) = &self.id_in {
            if !ids.contains(&site.id) {
                return false;
            }
        }
        if let Some(needle) = &self.hostname_contains {
            if !site.hostname.contains(needle.as_str()) {
                return false;
            }
        }
        true
    }
}

fn field_cmp(field: &str, a: &Site, b: &Site) -> Option<std::cmp::Ordering> {
    use std::cmp::Ordering;
    Some(match field {
        "id" => a.id.cmp(&b.id),
        "hostname" => a.hostname.cmp(&b.hostname),
        _ => return Option::<Ordering>::None,
    })
}

fn scan(state: &MaterializedState, owner_id: &UserId, filter: &SiteFilter) -> Vec<Site> {
    state
        .sites
        .values()
        .filter(|s| &s.owner_id == owner_id)
        .filter(|s| filter.matches(s))
        .cloned()
        .collect()
}

fn ordered(mut items: Vec<Site>, order_by: &[OrderKey]) -> Vec<Site> {
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
    filter: &SiteFilter,
    order_by: &[OrderKey],
    paginator: Paginator,
) -> Page<Site> {
    paginate(ordered(scan(state, owner_id, filter), order_by), paginator)
}

pub fn count(state: &MaterializedState, owner_id: &UserId, filter: &SiteFilter) -> usize {
    scan(state, owner_id, filter).len()
}

pub fn get(state: &MaterializedState, owner_id: &UserId, filter: &SiteFilter) -> Result<Site, QueryError> {
    crate::page::get_one(scan(state, owner_id, filter))
}
