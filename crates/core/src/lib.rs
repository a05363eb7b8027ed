// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jobctl-core: entity types, newtype ids, the `Event` log schema,
//! owner/auth primitives, and a `Clock` abstraction for the coordination
//! core of a distributed HPC job orchestrator. No I/O.

pub mod app;
pub mod batch_job;
pub mod clock;
pub mod error;
pub mod event;
pub mod id;
pub mod ids;
pub mod job;
pub mod log_event;
pub mod owned;
pub mod session;
pub mod site;
pub mod time_fmt;
pub mod transfer_item;

#[cfg(feature = "test-support")]
pub mod testing;

pub use app::{merge_backends_and_parameters, App, AppBackend};
pub use batch_job::{BatchJob, BatchJobState, FrozenFieldConflict, FrozenFieldsPatch};
pub use clock::{Clock, FakeClock, SystemClock};
pub use error::ErrorKind;
pub use event::Event;
pub use id::{IdGen, SequentialIdGen, ShortId, UuidIdGen};
pub use ids::{AppId, BatchJobId, JobId, LogEventId, SessionId, SiteId, TransferItemId, UserId};
pub use job::{
    validate_transition, InvalidTransition, Job, JobState, LockStatus, ResourceHints,
    TransitionActor,
};
pub use log_event::LogEvent;
pub use owned::Owned;
pub use session::{AcquireSpec, NodeResources, OrderKey, Session};
pub use site::{BackfillWindow, Site, SiteStatus};
pub use time_fmt::parse_wall_time_minutes;
pub use transfer_item::{TransferDirection, TransferItem, TransferState};
