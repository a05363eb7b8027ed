// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! App filter/order/paginate (§4.1.1, ADDED).

use jobctl_core::{App, AppId, OrderKey, SiteId, UserId};
use jobctl_storage::MaterializedState;
use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::order::sort_by_keys;
use crate::page::{paginate, Page, Paginator};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppFilter {
    pub id_in: Option<Vec<AppId>>,
    pub name_contains: Option<String>,
    /// Matches any backend's site.
    pub site_id: Option<SiteId>,
}

impl AppFilter {
    fn matches(&self, app: &App) -> bool {
        if let Some(ids) = &self.id_in {
            if !ids.contains(&app.id) {
                return false;
            }
        }
        if let Some(needle) = &self.name_contains {
            if !app.name.contains(needle.as_str()) {
                return false;
            }
        }
        if let Some(site_id) = &self.site_id {
            if !app.backends.iter().any(|b| b.site_ref == *site_id) {
                return false;
            }
        }
        true
    }
}

fn field_cmp(field: &str, a: &App, b: &App) -> Option<std::cmp::Ordering> {
    use std::cmp::Ordering;
    Some(match field {
        "id" => a.id.cmp(&b.id),
        "name" => a.name.cmp(&b.name),
        _ => return Option::<Ordering>::None,
    })
}

fn scan(state: &MaterializedState, owner_id: &UserId, filter: &AppFilter) -> Vec<App> {
    state
        .apps
        .values()
        .filter(|a| &a.owner_id == owner_id)
        .filter(|a| filter.matches(a))
        .cloned()
        .collect()
}

fn ordered(mut items: Vec<App>, order_by: &[OrderKey]) -> Vec<App> {
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
    filter: &AppFilter,
    order_by: &[OrderKey],
    paginator: Paginator,
) -> Page<App> {
    paginate(ordered(scan(state, owner_id, filter), order_by), paginator)
}

pub fn count(state: &MaterializedState, owner_id: &UserId, filter: &AppFilter) -> usize {
    scan(state, owner_id, filter).len()
}

pub fn get(state: &MaterializedState, owner_id: &UserId, filter: &AppFilter) -> Result<App, QueryError> {
    crate::page::get_one(scan(state, owner_id, filter))
}
