// src/logging.rs

//! Logging setup for `dagrun` using `tracing` + `tracing-subscriber`.
//!
//! The engine itself only emits `tracing` events; installing a subscriber is
//! left to the embedding application. This helper is the default one.
//!
//! Priority for determining the log level:
//! 1. an explicit level (e.g. `[engine].log_level` from a graph manifest)
//! 2. `DAGRUN_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Logs are sent to STDERR.

use anyhow::{Result, anyhow};
use tracing_subscriber::fmt;

use crate::types::LogLevel;

/// Initialise the global logging subscriber.
///
/// Fails if a global subscriber has already been installed.
pub fn init_logging(level: Option<LogLevel>) -> Result<()> {
    let level = resolve_level(level);

    fmt()
        .with_max_level(tracing::Level::from(level))
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(())
}

/// Pick the effective level from an explicit value or the environment.
pub fn resolve_level(level: Option<LogLevel>) -> LogLevel {
    match level {
        Some(lvl) => lvl,
        None => std::env::var("DAGRUN_LOG")
            .ok()
            .and_then(|s| s.parse::<LogLevel>().ok())
            .unwrap_or_default(),
    }
}
