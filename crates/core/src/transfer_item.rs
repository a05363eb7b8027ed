// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TransferItem entity: a file-movement record attached to a Job (§3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{JobId, TransferItemId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferState {
    Pending,
    Active,
    Done,
    Error,
}

/// Created alongside its parent Job, destroyed with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferItem {
    pub id: TransferItemId,
    pub job_ref: JobId,
    pub direction: TransferDirection,
    pub location_alias: String,
    pub remote_path: String,
    pub local_path: String,
    pub state: TransferState,
    pub state_timestamp: DateTime<Utc>,
}
