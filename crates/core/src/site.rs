// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Site entity: a named compute resource owned by a user (§3).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::SiteId;
use crate::owned::Owned;
use crate::UserId;

/// A `(num_nodes, wall_time_min)` pair advertised by a Site's scheduler,
/// indicating capacity available immediately for a given queue.
pub type BackfillWindow = (u32, u32);

/// Embedded status snapshot, refreshed by a scheduler adapter (§4.4.1).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteStatus {
    pub num_nodes: u32,
    pub num_idle_nodes: u32,
    pub num_busy_nodes: u32,
    #[serde(default)]
    pub backfill_windows: BTreeMap<String, Vec<BackfillWindow>>,
}

/// A named compute resource owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    pub owner_id: UserId,
    pub hostname: String,
    pub path: String,
    #[serde(default)]
    pub status: SiteStatus,
    pub last_refresh: DateTime<Utc>,
}

impl Site {
    /// The `(owner, hostname, path)` unique triple (§3).
    pub fn unique_key(&self) -> (UserId, String, String) {
        (self.owner_id.clone(), self.hostname.clone(), self.path.clone())
    }

    /// Boundary a scheduler adapter calls to refresh `status.backfill_windows`
    /// and `last_refresh` (§4.4.1). `queue_windows` is already reduced to the
    /// cumulative-capacity curve the adapter computed from its node-list
    /// report; this method only records it.
    pub fn apply_backfill_report(
        &mut self,
        queue_windows: BTreeMap<String, Vec<BackfillWindow>>,
        now: DateTime<Utc>,
    ) {
        self.status.backfill_windows = queue_windows;
        self.last_refresh = now;
    }
}

impl Owned for Site {
    fn owner_id(&self) -> &UserId {
        &self.owner_id
    }
}
