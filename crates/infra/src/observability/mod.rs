//! Tracing subscriber installation.
//!
//! Library code only emits `tracing` events; binaries and services call
//! [`init_tracing`] once at startup. `RUST_LOG` takes precedence over the
//! configured level so filters can be tightened without a config change.

use std::io::IsTerminal;

use meilisync_domain::{LoggingConfig, Result, TaskError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Installs the global subscriber described by `config`.
///
/// # Errors
/// `TaskError::Config` when the level is not a valid filter directive or a
/// global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;

    let layer = if config.json {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_filter(filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_ansi(std::io::stdout().is_terminal())
            .with_filter(filter)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| TaskError::Config(format!("failed to install tracing subscriber: {e}")))?;

    tracing::debug!(level = %config.level, json = config.json, "tracing initialized");
    Ok(())
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .map_err(|e| TaskError::Config(format!("invalid log level `{}`: {e}", config.level)))
}
