// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job filter/order/paginate (§4.1).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use jobctl_core::{AppId, BatchJobId, Job, JobId, JobState, OrderKey, SiteId, UserId};
use jobctl_storage::MaterializedState;
use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::order::sort_by_keys;
use crate::page::{paginate, Page, Paginator};

/// AND-composed optional predicates over the jobs collection (§4.1).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobFilter {
    pub id_in: Option<Vec<JobId>>,
    /// Any-of: a job matches if any of its `parents` is in this list.
    pub parent_id_in: Option<Vec<JobId>>,
    pub app_id: Option<AppId>,
    /// Matches if any of the job's app's backends is at this site.
    pub site_id: Option<SiteId>,
    pub batch_job_id: Option<BatchJobId>,
    pub last_update_le: Option<DateTime<Utc>>,
    pub last_update_ge: Option<DateTime<Utc>>,
    pub workdir_contains: Option<String>,
    pub state_in: Option<Vec<JobState>>,
    pub state_ne: Option<JobState>,
    /// Subset test: job.tags must contain every key/value pair listed here.
    #[serde(default)]
    pub tags_superset: BTreeMap<String, String>,
    #[serde(default)]
    pub parameters_superset: BTreeMap<String, String>,
}

impl JobFilter {
    fn matches(&self, job: &Job, state: &MaterializedState) -> bool {
        if let Some(ids) = &self.id_in {
            if !ids.contains(&job.id) {
                return false;
            }
        }
        if let Some(parents) = &self.parent_id_in {
            if !job.parents.iter().any(|p| parents.contains(p)) {
                return false;
            }
        }
        if let Some(app_id) = &self.app_id {
            if job.app_ref != *app_id {
                return false;
            }
        }
        if let Some(site_id) = &self.site_id {
            let at_site = state
                .get_app(job.app_ref.as_str())
                .is_some_and(|app| app.backends.iter().any(|b| b.site_ref == *site_id));
            if !at_site {
                return false;
            }
        }
        if let Some(bj) = &self.batch_job_id {
            if job.batch_job_ref.as_ref() != Some(bj) {
                return false;
            }
        }
        if let Some(le) = self.last_update_le {
            if job.last_update > le {
                return false;
            }
        }
        if let Some(ge) = self.last_update_ge {
            if job.last_update < ge {
                return false;
            }
        }
        if let Some(needle) = &self.workdir_contains {
            if !job.workdir.contains(needle.as_str()) {
                return false;
            }
        }
        if let Some(states) = &self.state_in {
            if !states.contains(&job.state) {
                return false;
            }
        }
        if let Some(ne) = self.state_ne {
            if job.state == ne {
                return false;
            }
        }
        if !self
            .tags_superset
            .iter()
            .all(|(k, v)| job.tags.get(k) == Some(v))
        {
            return false;
        }
        if !self
            .parameters_superset
            .iter()
            .all(|(k, v)| job.parameters.get(k) == Some(v))
        {
            return false;
        }
        true
    }
}

fn field_cmp(field: &str, a: &Job, b: &Job) -> Option<std::cmp::Ordering> {
    use std::cmp::Ordering;
    Some(match field {
        "id" => a.id.cmp(&b.id),
        "workdir" => a.workdir.cmp(&b.workdir),
        "state" => format!("{}", a.state).cmp(&format!("{}", b.state)),
        "last_update" => a.last_update.cmp(&b.last_update),
        "wall_time_min" => a.resources.wall_time_min.cmp(&b.resources.wall_time_min),
        _ => return Option::<Ordering>::None,
    })
}

fn scan(state: &MaterializedState, owner_id: &UserId, filter: &JobFilter) -> Vec<Job> {
    state
        .jobs
        .values()
        .filter(|j| &j.owner_id == owner_id)
        .filter(|j| filter.matches(j, state))
        .cloned()
        .collect()
}

fn ordered(mut items: Vec<Job>, order_by: &[OrderKey]) -> Vec<Job> {
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

/// List jobs matching `filter`, ordered by `order_by` (default `id` ascending),
/// paginated (§4.1).
pub fn list(
    state: &MaterializedState,
    owner_id: &UserId,
    filter: &JobFilter,
    order_by: &[OrderKey],
    paginator: Paginator,
) -> Page<Job> {
    paginate(ordered(scan(state, owner_id, filter), order_by), paginator)
}

/// `count` is a projection of the filter with no pagination (§4.1).
pub fn count(state: &MaterializedState, owner_id: &UserId, filter: &JobFilter) -> usize {
    scan(state, owner_id, filter).len()
}

/// `get` returns exactly one entity or fails (§4.1).
pub fn get(state: &MaterializedState, owner_id: &UserId, filter: &JobFilter) -> Result<Job, QueryError> {
    crate::page::get_one(scan(state, owner_id, filter))
}
