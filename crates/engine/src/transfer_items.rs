// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TransferItem write path: `/transfers/{id}` grants `PATCH` only (§6); there
//! is no create or delete route because TransferItems are created alongside
//! their parent Job and destroyed with it (§3, `jobs::create`/`jobs::delete`).

use chrono::{DateTime, Utc};
use jobctl_core::{Clock, Event, IdGen, TransferItemId, TransferState, UserId};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::notifier::{Action, Entity, Notification};
use crate::store::Engine;

/// Writable fields of `PATCH /transfers/{id}` (§3). Ownership is derived
/// through the parent Job, which has no `owner_id` field of its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferItemPatch {
    pub state: Option<TransferState>,
    pub state_timestamp: Option<DateTime<Utc>>,
}

/// `PATCH /transfers/{id}`: update `state`/`state_timestamp`. Setting
/// `state` without an explicit `state_timestamp` stamps the engine clock,
/// matching the Job state machine's own convention (§4.3).
pub fn update<C: Clock, G: IdGen>(
    engine: &Engine<C, G>,
    owner_id: &UserId,
    id: &TransferItemId,
    patch: TransferItemPatch,
) -> Result<jobctl_core::TransferItem, EngineError> {
    let item = engine.commit(|state| {
        let mut item = state
            .transfer_items
            .get(id.as_str())
            .filter(|t| {
                state
                    .get_job(t.job_ref.as_str())
                    .is_some_and(|j| j.owner_id == *owner_id)
            })
            .cloned()
            .ok_or(EngineError::NotFound)?;

        let state_changed = patch.state.is_some();
        if let Some(v) = patch.state {
            item.state = v;
        }
        if let Some(v) = patch.state_timestamp {
            item.state_timestamp = v;
        } else if state_changed {
            item.state_timestamp = engine.now();
        }

        Ok((item.clone(), vec![Event::TransferItemReplaced { item }]))
    })?;

    engine.notifier.publish(Notification {
        owner_id: owner_id.clone(),
        action: Action::BulkUpdate,
        entity: Entity::TransferItem,
        ids: vec![item.id.as_str().to_string()],
    });

    Ok(item)
}
