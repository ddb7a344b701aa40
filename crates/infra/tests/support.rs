//! Shared fixtures for `meilisync-infra` integration tests.

#![allow(dead_code)]

use std::time::Duration;

use meilisync_infra::{HttpClient, MeiliClient};
use serde_json::{json, Value};
use wiremock::MockServer;

pub const API_KEY: &str = "test-master-key";

/// Client pointed at `server` with short timeouts and fast retries.
pub fn client_for(server: &MockServer, api_key: Option<&str>) -> MeiliClient {
    let http = HttpClient::builder()
        .timeout(Duration::from_millis(500))
        .base_backoff(Duration::from_millis(5))
        .max_attempts(3)
        .build()
        .expect("http client should build");
    MeiliClient::with_http(server.uri(), api_key.map(str::to_string), http)
}

/// Body of `GET /tasks/{uid}`.
pub fn task_json(uid: u64, status: &str) -> Value {
    let mut task = json!({
        "uid": uid,
        "batchUid": null,
        "indexUid": "movies",
        "status": status,
        "type": "documentAdditionOrUpdate",
        "canceledBy": null,
        "details": { "receivedDocuments": 2, "indexedDocuments": null },
        "error": null,
        "duration": null,
        "enqueuedAt": "2024-05-01T10:00:00.000000Z",
        "startedAt": null,
        "finishedAt": null
    });
    if matches!(status, "succeeded" | "failed" | "canceled") {
        task["startedAt"] = json!("2024-05-01T10:00:00.100000Z");
        task["finishedAt"] = json!("2024-05-01T10:00:01.250000Z");
    }
    if status == "failed" {
        task["error"] = json!({
            "message": "Document identifier `\"1 2\"` is invalid.",
            "code": "invalid_document_id",
            "type": "invalid_request",
            "link": "https://docs.meilisearch.com/errors#invalid_document_id"
        });
    }
    task
}

/// Body returned by write endpoints.
pub fn enqueued_json(uid: u64, index_uid: Option<&str>, kind: &str) -> Value {
    json!({
        "taskUid": uid,
        "indexUid": index_uid,
        "status": "enqueued",
        "type": kind,
        "enqueuedAt": "2024-05-01T10:00:00.000000Z"
    })
}
