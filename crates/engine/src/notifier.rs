// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Best-effort pub/sub fan-out of mutation records (§4.6, §4.6.1).
//!
//! One `tokio::sync::broadcast` channel per `owner_id`, created lazily the
//! first time a subscriber registers. Publishing is `try_send`-shaped: a
//! lagging subscriber is dropped (`RecvError::Lagged`) rather than
//! back-pressuring the publisher, matching "best-effort, non-blocking" more
//! directly than a shared `mpsc` would, whose single-consumer wake-channel
//! idiom this fans out rather than copies verbatim (§4.6.1).

use std::collections::HashMap;
use std::sync::Arc;

use jobctl_core::UserId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Bounded channel capacity; a subscriber more than this many messages
/// behind the publisher lags and is dropped.
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    BulkCreate,
    BulkUpdate,
    BulkDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Entity {
    Site,
    App,
    BatchJob,
    Job,
    Event,
    TransferItem,
}

/// One published mutation record: an (owner, action, entity) triple (§4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub owner_id: UserId,
    pub action: Action,
    pub entity: Entity,
    /// Ids affected by the mutation, for a subscriber to decide whether to
    /// re-fetch.
    pub ids: Vec<String>,
}

#[derive(Default)]
pub struct Notifier {
    channels: Mutex<HashMap<UserId, broadcast::Sender<Notification>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to an owner's notification stream, creating its channel on
    /// first use.
    pub fn subscribe(&self, owner_id: &UserId) -> broadcast::Receiver<Notification> {
        let mut channels = self.channels.lock();
        channels
            .entry(owner_id.clone())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Publish one notification. A no-op if nobody has ever subscribed for
    /// this owner (no channel to send on) — mutations never block on
    /// publish (§4.6, §5).
    pub fn publish(&self, notification: Notification) {
        let channels = self.channels.lock();
        if let Some(tx) = channels.get(&notification.owner_id) {
            // Send failure means zero current receivers; not an error.
            let _ = tx.send(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscriber_receives_published_notification_for_its_owner() {
        let notifier = Notifier::new();
        let owner = UserId::new("u1");
        let mut rx = notifier.subscribe(&owner);
        notifier.publish(Notification {
            owner_id: owner.clone(),
            action: Action::BulkCreate,
            entity: Entity::Job,
            ids: vec!["job-1".into()],
        });
        let received = rx.try_recv().expect("message delivered");
        assert_eq!(received.ids, vec!["job-1".to_string()]);
    }

    #[test]
    fn publish_with_no_subscribers_is_a_silent_no_op() {
        let notifier = Notifier::new();
        notifier.publish(Notification {
            owner_id: UserId::new("u1"),
            action: Action::BulkDelete,
            entity: Entity::Site,
            ids: vec![],
        });
    }

    #[test]
    fn notifications_are_scoped_per_owner() {
        let notifier = Notifier::new();
        let u1 = UserId::new("u1");
        let u2 = UserId::new("u2");
        let mut rx1 = notifier.subscribe(&u1);
        let mut rx2 = notifier.subscribe(&u2);
        notifier.publish(Notification {
            owner_id: u1,
            action: Action::BulkUpdate,
            entity: Entity::Job,
            ids: vec!["job-1".into()],
        });
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_err());
    }
}
