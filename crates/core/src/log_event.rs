// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LogEvent: an append-only record of a single Job state transition (§3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{JobId, LogEventId};
use crate::job::JobState;

/// Immutable. Every accepted state transition — including the implicit
/// `∅ → STAGED_IN` at creation and, when applicable, the immediately
/// following `STAGED_IN → READY` — appends exactly one LogEvent (§3, §4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub id: LogEventId,
    pub job_ref: JobId,
    pub timestamp: DateTime<Utc>,
    pub from_state: Option<JobState>,
    pub to_state: JobState,
    pub message: String,
}
