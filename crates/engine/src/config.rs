// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-wide tunables. Loaded from the process config by `jobctl-daemon`
//! (SPEC_FULL §2.1); defaults here are what a fresh `Engine::new` gets in
//! tests absent an explicit override.

use chrono::Duration;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Hard ceiling `limit` is clamped against on every list query (§4.1).
    pub max_page_size: usize,
    /// Default `max_num_acquire` ceiling when a client proposes a larger one (§4.4).
    pub max_num_acquire: u32,
    /// A session with no `tick` for longer than this is reaped by the
    /// expiry sweep (§4.4).
    pub session_expiry: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_page_size: 500,
            max_num_acquire: 1000,
            session_expiry: Duration::seconds(300),
        }
    }
}
