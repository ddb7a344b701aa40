//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files.

use std::io::Write;

use meilisync_domain::TaskError;
use meilisync_infra::config;
use tempfile::NamedTempFile;

fn temp_config(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("meilisync")
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(contents.as_bytes()).expect("Failed to write to temp file");
    file
}

#[test]
fn test_load_config_from_json_file() {
    let file = temp_config(
        ".json",
        r#"{
            "client": {
                "host": "http://search.internal:7700",
                "api_key": "json-key",
                "timeout_ms": 10000,
                "max_attempts": 5
            },
            "tracker": {
                "poll_interval_ms": 500,
                "max_poll_errors": 3,
                "refresh_interval_ms": 15000
            },
            "wait": { "timeout_ms": 20000 }
        }"#,
    );

    let config = config::load_from_file(Some(file.path().to_path_buf()))
        .expect("Failed to load config from JSON file");

    assert_eq!(config.client.host, "http://search.internal:7700");
    assert_eq!(config.client.api_key.as_deref(), Some("json-key"));
    assert_eq!(config.client.timeout_ms, 10_000);
    assert_eq!(config.client.max_attempts, 5);
    assert_eq!(config.tracker.poll_interval_ms, 500);
    assert_eq!(config.tracker.max_poll_errors, 3);
    assert_eq!(config.tracker.refresh_interval_ms, Some(15_000));
    assert_eq!(config.wait.timeout_ms, 20_000);
}

#[test]
fn test_load_config_from_toml_file() {
    let file = temp_config(
        ".toml",
        r#"
[client]
host = "http://localhost:7700"

[batch]
chunk_size = 250
memory_budget_mb = 25.0
wait_for_completion = true

[logging]
level = "meilisync_core=debug"
json = true
"#,
    );

    let config = config::load_from_file(Some(file.path().to_path_buf()))
        .expect("Failed to load config from TOML file");

    assert_eq!(config.batch.chunk_size, 250);
    assert_eq!(config.batch.memory_budget_mb, 25.0);
    assert!(config.batch.wait_for_completion);
    assert_eq!(config.logging.level, "meilisync_core=debug");
    assert!(config.logging.json);
    assert_eq!(config.tracker, meilisync_domain::TrackerConfig::default());
}

#[test]
fn test_load_config_missing_file() {
    let result = config::load_from_file(Some("/nonexistent/meilisync.toml".into()));
    assert!(matches!(result, Err(TaskError::Config(_))));
}

#[test]
fn test_load_config_invalid_toml() {
    let file = temp_config(".toml", "[client\nhost = ");

    let result = config::load_from_file(Some(file.path().to_path_buf()));
    match result {
        Err(TaskError::Config(message)) => assert!(message.contains("TOML")),
        other => panic!("expected config error, got {other:?}"),
    }
}
