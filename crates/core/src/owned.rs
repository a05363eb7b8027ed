// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ownership primitive shared by every entity in the system.

use crate::ids::UserId;

/// Implemented by every persisted entity. Resource authorization (§4's
/// "Resource authorization" component) is built entirely on this one
/// method: a read or write is permitted iff `entity.owner_id() == requester`.
pub trait Owned {
    fn owner_id(&self) -> &UserId;

    /// True when `requester` may observe or mutate this entity. Cross-owner
    /// access is deliberately indistinguishable from a missing id (§3) —
    /// callers should map `false` to `ErrorKind::NotFound`, never to a
    /// separate "forbidden" kind.
    fn is_owned_by(&self, requester: &UserId) -> bool {
        self.owner_id() == requester
    }
}
