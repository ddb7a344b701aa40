//! Configuration loader
//!
//! Loads meilisync configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `MEILISYNC_HOST` is not set, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `MEILISYNC_HOST`: MeiliSearch base URL (required for env loading)
//! - `MEILISYNC_API_KEY`: API key sent as a bearer token
//! - `MEILISYNC_TIMEOUT_MS`: HTTP request timeout in milliseconds
//! - `MEILISYNC_POLL_INTERVAL_MS`: Tracker poll interval in milliseconds
//! - `MEILISYNC_CHUNK_SIZE`: Default batch chunk size
//! - `MEILISYNC_LOG_LEVEL`: Log filter directive (e.g. `info`, `meilisync_core=debug`)
//! - `MEILISYNC_LOG_JSON`: Emit JSON logs (true/false)
//!
//! Settings without a variable keep their defaults.
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./meilisync.toml`, `./meilisync.json`, `./config.toml`, `./config.json`
//! 2. The same names in the parent and grandparent directories
//! 3. The same names relative to the executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use meilisync_domain::constants::{MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};
use meilisync_domain::{Config, Result, TaskError};

const CONFIG_FILE_NAMES: [&str; 4] = ["meilisync.toml", "meilisync.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If `MEILISYNC_HOST`
/// is missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `TaskError::Config` if:
/// - An environment variable has an invalid value
/// - No config file is found when falling back
/// - File format is invalid
pub fn load() -> Result<Config> {
    if std::env::var_os("MEILISYNC_HOST").is_none() {
        tracing::debug!("MEILISYNC_HOST not set, loading configuration from file");
        return load_from_file(None);
    }

    let config = load_from_env()?;
    tracing::info!(host = %config.client.host, "Configuration loaded from environment variables");
    Ok(config)
}

/// Load configuration from environment variables
///
/// `MEILISYNC_HOST` must be present; every other variable is optional.
///
/// # Errors
/// Returns `TaskError::Config` if the host is missing or a variable has an
/// invalid value.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.client.host = env_var("MEILISYNC_HOST")?;
    config.client.api_key = std::env::var("MEILISYNC_API_KEY").ok().filter(|key| !key.is_empty());
    if let Some(timeout_ms) = env_parse::<u64>("MEILISYNC_TIMEOUT_MS")? {
        config.client.timeout_ms = timeout_ms;
    }

    if let Some(poll_interval_ms) = env_parse::<u64>("MEILISYNC_POLL_INTERVAL_MS")? {
        if poll_interval_ms == 0 {
            return Err(TaskError::Config("MEILISYNC_POLL_INTERVAL_MS must be greater than 0".into()));
        }
        config.tracker.poll_interval_ms = poll_interval_ms;
    }

    if let Some(chunk_size) = env_parse::<usize>("MEILISYNC_CHUNK_SIZE")? {
        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&chunk_size) {
            return Err(TaskError::Config(format!(
                "MEILISYNC_CHUNK_SIZE must be between {MIN_CHUNK_SIZE} and {MAX_CHUNK_SIZE}, got {chunk_size}"
            )));
        }
        config.batch.chunk_size = chunk_size;
    }

    if let Ok(level) = std::env::var("MEILISYNC_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("MEILISYNC_LOG_JSON", config.logging.json);

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `TaskError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(TaskError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            TaskError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| TaskError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
pub(crate) fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    let config: Config = match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| TaskError::Config(format!("Invalid TOML format: {}", e)))?,
        "json" => serde_json::from_str(contents)
            .map_err(|e| TaskError::Config(format!("Invalid JSON format: {}", e)))?,
        _ => return Err(TaskError::Config(format!("Unsupported config format: {}", extension))),
    };

    validate(&config)?;
    Ok(config)
}

/// Rejects values that would stall polling or batching.
fn validate(config: &Config) -> Result<()> {
    if config.tracker.poll_interval_ms == 0 {
        return Err(TaskError::Config("tracker.poll_interval_ms must be greater than 0".into()));
    }
    if config.wait.interval_ms == 0 || config.wait.max_interval_ms == 0 {
        return Err(TaskError::Config(
            "wait.interval_ms and wait.max_interval_ms must be greater than 0".into(),
        ));
    }
    if !config.wait.backoff_factor.is_finite() || config.wait.backoff_factor < 1.0 {
        return Err(TaskError::Config(format!(
            "wait.backoff_factor must be at least 1.0, got {}",
            config.wait.backoff_factor
        )));
    }
    if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&config.batch.chunk_size) {
        return Err(TaskError::Config(format!(
            "batch.chunk_size must be between {MIN_CHUNK_SIZE} and {MAX_CHUNK_SIZE}, got {}",
            config.batch.chunk_size
        )));
    }
    Ok(())
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.extend([exe_dir.to_path_buf(), exe_dir.join(".."), exe_dir.join("../..")]);
        }
    }

    probe_in(&roots)
}

fn probe_in(roots: &[PathBuf]) -> Option<PathBuf> {
    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `TaskError::Config` if the variable is not set or empty.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| TaskError::Config(format!("Missing required environment variable: {}", key)))
}

/// Parse an optional environment variable.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| TaskError::Config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
