// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tracing` setup: a non-blocking file appender plus `EnvFilter`, exactly
//! as the reference daemon sets it up (SPEC_FULL §2.1). The returned guard
//! must be held for the process lifetime or buffered log lines are lost on
//! exit.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;
use crate::error::DaemonError;

/// Install a global `tracing` subscriber writing to `config.log_path`,
/// filtered by `RUST_LOG` (defaulting to `info`). Returns the
/// `WorkerGuard` the caller must keep alive.
pub fn init(config: &Config) -> Result<tracing_appender::non_blocking::WorkerGuard, DaemonError> {
    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().unwrap_or_else(|| std::path::Path::new(".")),
        config.log_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("jobctl.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
