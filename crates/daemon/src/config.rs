// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process configuration: state directory, durability paths, and the
//! engine tunables of `jobctl_engine::EngineConfig` (SPEC_FULL §2.1).
//!
//! Resolution order for the state directory mirrors the reference
//! daemon's `env::state_dir`: `JOBCTL_STATE_DIR` > `XDG_STATE_HOME/jobctl`
//! > `~/.local/state/jobctl`.

use std::path::PathBuf;

use jobctl_engine::EngineConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine a state directory (no JOBCTL_STATE_DIR, XDG_STATE_HOME, or HOME)")]
    NoStateDir,
}

/// On-disk layout plus the engine tunables a running process needs.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. `~/.local/state/jobctl`).
    pub state_dir: PathBuf,
    /// Path to the daemon log file.
    pub log_path: PathBuf,
    /// Path to the single-instance advisory lock / pid file.
    pub lock_path: PathBuf,
    /// Path to the group-commit WAL.
    pub wal_path: PathBuf,
    /// Path to the compacted snapshot file.
    pub snapshot_path: PathBuf,
    pub engine: EngineConfig,
}

impl Config {
    /// Load configuration from the environment, falling back to the
    /// defaults below for anything not overridden. There is no config
    /// file: every tunable has a `JOBCTL_*` environment variable.
    pub fn load() -> Result<Self, ConfigError> {
        let state_dir = state_dir()?;
        let engine = EngineConfig {
            max_page_size: env_usize("JOBCTL_MAX_PAGE_SIZE").unwrap_or(EngineConfig::default().max_page_size),
            max_num_acquire: env_u32("JOBCTL_MAX_NUM_ACQUIRE").unwrap_or(EngineConfig::default().max_num_acquire),
            session_expiry: env_seconds("JOBCTL_SESSION_EXPIRY_SECONDS")
                .unwrap_or(EngineConfig::default().session_expiry),
        };

        Ok(Self {
            log_path: state_dir.join("jobctl.log"),
            lock_path: state_dir.join("jobctl.pid"),
            wal_path: state_dir.join("wal").join("events.wal"),
            snapshot_path: state_dir.join("snapshot.json"),
            state_dir,
            engine,
        })
    }
}

fn state_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("JOBCTL_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("jobctl"));
    }
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/jobctl"))
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

fn env_seconds(key: &str) -> Option<chrono::Duration> {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .map(chrono::Duration::seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    // `std::env::set_var`/`remove_var` race across tests running in parallel
    // in the same process; serialize every test that touches JOBCTL_*/HOME
    // behind this lock rather than reaching for `unsafe` (forbidden workspace-
    // wide) to silence the 2024-edition signature some toolchains now require.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[test]
    fn defaults_apply_when_nothing_is_overridden() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("JOBCTL_STATE_DIR");
        std::env::remove_var("JOBCTL_MAX_PAGE_SIZE");
        std::env::set_var("HOME", "/tmp/jobctl-config-test-home");
        let config = Config::load().unwrap();
        assert_eq!(config.engine.max_page_size, EngineConfig::default().max_page_size);
        assert!(config.state_dir.ends_with(".local/state/jobctl"));
    }

    #[test]
    fn state_dir_env_var_takes_priority() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("JOBCTL_STATE_DIR", "/tmp/jobctl-explicit-state-dir");
        let config = Config::load().unwrap();
        assert_eq!(config.state_dir, PathBuf::from("/tmp/jobctl-explicit-state-dir"));
        std::env::remove_var("JOBCTL_STATE_DIR");
    }
}
