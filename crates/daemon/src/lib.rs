// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jobctl-daemon: process wiring around the `jobctl-engine` transactional
//! core (SPEC_FULL §2.1, §5.1, §6.1) — configuration, logging, startup
//! recovery, background checkpoint/session-sweep loops, and the typed
//! `Request`/`Response` protocol a transport binds to. This crate never
//! opens a socket; that boundary is deliberately out of scope (§1).

pub mod config;
pub mod dispatch;
pub mod error;
pub mod housekeeping;
pub mod lock;
pub mod logging;
pub mod protocol;
pub mod protocol_wire;
pub mod startup;

pub use config::Config;
pub use dispatch::dispatch;
pub use error::DaemonError;
pub use lock::InstanceLock;
pub use protocol::{ListArgs, Request, Response};
pub use startup::build_engine;
