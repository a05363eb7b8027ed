// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entity identifier types.
//!
//! Every entity id is a distinct newtype over a `{prefix}-{token}` string,
//! generated via [`crate::id::IdGen`] and compared/serialized as a bare string.

crate::define_id! {
    /// Identifies a compute resource owned by a user.
    pub struct SiteId;
}

crate::define_id! {
    /// Identifies an owner-scoped logical computation.
    #[derive(Default)]
    pub struct AppId;
}

crate::define_id! {
    /// Identifies a scheduler allocation request submitted to a Site.
    pub struct BatchJobId;
}

crate::define_id! {
    /// Identifies an individual computation instance scheduled against an App.
    pub struct JobId;
}

crate::define_id! {
    /// Identifies a file-movement record attached to a Job.
    pub struct TransferItemId;
}

crate::define_id! {
    /// Identifies a single immutable state-transition record.
    pub struct LogEventId;
}

crate::define_id! {
    /// Identifies a launcher's lease scope.
    pub struct SessionId;
}

crate::define_id! {
    /// Identifies the owning principal of every entity in the system.
    pub struct UserId;
}
