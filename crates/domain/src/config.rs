//! Configuration structures
//!
//! Durations are stored as milliseconds so the same struct round-trips
//! through environment variables, JSON and TOML; accessor methods hand out
//! [`Duration`] values.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CLEANUP_INTERVAL_MS, COMPLETED_RETENTION_MS, DEFAULT_CHUNK_SIZE, DEFAULT_HOST,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_MEMORY_BUDGET_MB, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_RETRY_BACKOFF_MS, DEFAULT_WAIT_INTERVAL_MS,
    DEFAULT_WAIT_TIMEOUT_MS, MAX_COMPLETED_ENTRIES, MAX_CONSECUTIVE_POLL_ERRORS,
    MAX_REFRESH_BACKOFF_MS, MAX_WAIT_INTERVAL_MS, WAIT_BACKOFF_FACTOR,
};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub client: ClientConfig,
    pub tracker: TrackerConfig,
    pub batch: BatchConfig,
    pub wait: WaitConfig,
    pub logging: LoggingConfig,
}

/// HTTP connection settings for the remote task API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub host: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            api_key: None,
            timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Task tracker polling and retention settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub poll_interval_ms: u64,
    /// Polling for a task stops once this many consecutive fetches fail.
    pub max_poll_errors: u32,
    pub completed_retention_ms: u64,
    pub max_completed_entries: usize,
    pub cleanup_interval_ms: u64,
    /// Bulk refresh period; `None` disables the refresh loop.
    pub refresh_interval_ms: Option<u64>,
    pub max_refresh_backoff_ms: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_poll_errors: MAX_CONSECUTIVE_POLL_ERRORS,
            completed_retention_ms: COMPLETED_RETENTION_MS,
            max_completed_entries: MAX_COMPLETED_ENTRIES,
            cleanup_interval_ms: CLEANUP_INTERVAL_MS,
            refresh_interval_ms: None,
            max_refresh_backoff_ms: MAX_REFRESH_BACKOFF_MS,
        }
    }
}

impl TrackerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn completed_retention(&self) -> Duration {
        Duration::from_millis(self.completed_retention_ms)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval_ms.map(Duration::from_millis)
    }

    pub fn max_refresh_backoff(&self) -> Duration {
        Duration::from_millis(self.max_refresh_backoff_ms)
    }
}

/// Chunking defaults for batch submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub chunk_size: usize,
    pub memory_budget_mb: f64,
    pub wait_for_completion: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            memory_budget_mb: DEFAULT_MEMORY_BUDGET_MB,
            wait_for_completion: false,
        }
    }
}

/// Defaults for waiting on a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    pub timeout_ms: u64,
    pub interval_ms: u64,
    pub max_interval_ms: u64,
    pub backoff_factor: f64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            interval_ms: DEFAULT_WAIT_INTERVAL_MS,
            max_interval_ms: MAX_WAIT_INTERVAL_MS,
            backoff_factor: WAIT_BACKOFF_FACTOR,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `meilisync_core=debug`.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}
