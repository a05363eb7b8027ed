// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session entity and the acquisition request shape (§3, §4.4).

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{BatchJobId, JobId, SessionId, SiteId};
use crate::job::JobState;
use crate::owned::Owned;
use crate::UserId;

/// A launcher's lease scope (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub owner_id: UserId,
    pub site_ref: SiteId,
    pub batch_job_ref: Option<BatchJobId>,
    pub heartbeat: DateTime<Utc>,
    #[serde(default)]
    pub acquired_job_refs: BTreeSet<JobId>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>, expiry: chrono::Duration) -> bool {
        now - self.heartbeat > expiry
    }
}

impl Owned for Session {
    fn owner_id(&self) -> &UserId {
        &self.owner_id
    }
}

/// A snapshot of a launcher's node pool used for bin-packed job selection
/// (§4.4). Parallel arrays are one entry per node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeResources {
    pub max_jobs_per_node: u32,
    pub max_wall_time_min: u32,
    pub running_job_counts: Vec<u32>,
    pub node_occupancies: Vec<f64>,
    pub idle_cores: Vec<u32>,
    pub idle_gpus: Vec<u32>,
}

impl NodeResources {
    pub fn num_nodes(&self) -> usize {
        self.running_job_counts.len()
    }
}

/// A single signed ordering column, e.g. `-wall_time_min` (descending).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderKey {
    pub field: String,
    pub descending: bool,
}

impl OrderKey {
    pub fn parse(spec: &str) -> OrderKey {
        if let Some(field) = spec.strip_prefix('-') {
            OrderKey {
                field: field.to_string(),
                descending: true,
            }
        } else {
            OrderKey {
                field: spec.to_string(),
                descending: false,
            }
        }
    }
}

/// The request body of `/sessions/{id}/acquire` (§4.4, §6.1).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcquireSpec {
    pub states: Vec<JobState>,
    #[serde(default)]
    pub filter_tags: BTreeMap<String, String>,
    #[serde(default)]
    pub acquire_unbound: bool,
    pub max_num_acquire: u32,
    #[serde(default)]
    pub node_resources: Option<NodeResources>,
    #[serde(default)]
    pub order_by: Vec<String>,
}
