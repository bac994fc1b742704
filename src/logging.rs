// src/logging.rs

//! Logging setup for `cmdrun` using `tracing` + `tracing-subscriber`.
//!
//! The filter comes from `--log-level`, else from `CMDRUN_LOG` (any
//! `EnvFilter` directive, e.g. `debug` or `cmdrun::exec=trace`), else `info`.
//!
//! Logs go to stderr, so stdout carries nothing but the child's stdout.

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Environment variable consulted when no `--log-level` is given.
pub const LOG_ENV: &str = "CMDRUN_LOG";

/// Initialise global logging subscriber.
///
/// Call once at startup; a second call fails.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(lvl) => EnvFilter::new(lvl.as_directive()),
        None => filter_from_env()?,
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!(e))
        .context("installing tracing subscriber")
}

fn filter_from_env() -> Result<EnvFilter> {
    match std::env::var(LOG_ENV) {
        Ok(s) if !s.trim().is_empty() => EnvFilter::try_new(s.trim())
            .with_context(|| format!("invalid {} directive '{}'", LOG_ENV, s)),
        _ => Ok(EnvFilter::new("info")),
    }
}
