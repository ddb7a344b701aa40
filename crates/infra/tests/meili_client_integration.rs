//! Integration tests for `MeiliClient` against a mocked MeiliSearch
//!
//! **Coverage:**
//! - Task lookup and listing, including query parameters and auth header
//! - Document writes with and without a primary key
//! - Error payload mapping and retry behaviour
//! - Bulk task cancelation/deletion and health checks

#[path = "support.rs"]
mod support;

use meilisync_core::{collect_task_stats, DocumentWriter, TaskStatusClient};
use meilisync_domain::{TaskError, TaskQuery, TaskStatus, TaskUid, TransportError};
use serde_json::json;
use support::{client_for, enqueued_json, task_json, API_KEY};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Tasks
// ============================================================================

#[tokio::test]
async fn get_task_parses_the_record_and_sends_the_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks/42"))
        .and(header("authorization", format!("Bearer {API_KEY}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_json(42, "failed")))
        .expect(1)
        .mount(&server)
        .await;

    let record = client_for(&server, Some(API_KEY)).get_task(TaskUid(42)).await.unwrap();

    assert_eq!(record.uid, TaskUid(42));
    assert_eq!(record.status, TaskStatus::Failed);
    assert_eq!(record.index_uid.as_deref(), Some("movies"));
    assert_eq!(record.task_type, "documentAdditionOrUpdate");
    assert!(record.finished_at.is_some());
    assert_eq!(record.error.unwrap().code, "invalid_document_id");
}

#[tokio::test]
async fn requests_without_api_key_carry_no_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_json(1, "enqueued")))
        .mount(&server)
        .await;

    client_for(&server, None).get_task(TaskUid(1)).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn missing_task_maps_the_error_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks/7"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Task `7` not found.",
            "code": "task_not_found",
            "type": "invalid_request",
            "link": "https://docs.meilisearch.com/errors#task_not_found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server, None).get_task(TaskUid(7)).await.unwrap_err();

    match err {
        TaskError::Transport(TransportError { status, message, code, kind, .. }) => {
            assert_eq!(status, Some(404));
            assert_eq!(message, "Task `7` not found.");
            assert_eq!(code.as_deref(), Some("task_not_found"));
            assert_eq!(kind.as_deref(), Some("invalid_request"));
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn server_errors_are_retried_then_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks/3"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let err = client_for(&server, None).get_task(TaskUid(3)).await.unwrap_err();

    assert!(err.is_retryable());
    assert!(matches!(err, TaskError::Transport(TransportError { status: Some(503), .. })));
}

#[tokio::test]
async fn get_tasks_sends_filters_as_comma_separated_lists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .and(query_param("uids", "1,2"))
        .and(query_param("statuses", "enqueued,processing"))
        .and(query_param("indexUids", "movies"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [task_json(2, "processing"), task_json(1, "enqueued")],
            "total": 2,
            "limit": 20,
            "from": 2,
            "next": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = TaskQuery::for_uids([TaskUid(1), TaskUid(2)])
        .with_statuses([TaskStatus::Enqueued, TaskStatus::Processing])
        .with_index_uids(["movies"])
        .with_limit(20);
    let page = client_for(&server, None).get_tasks(&query).await.unwrap();

    assert_eq!(page.results.len(), 2);
    assert_eq!(page.total, Some(2));
    assert_eq!(page.next, None);
}

#[tokio::test]
async fn task_stats_walk_every_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .and(query_param("from", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [task_json(1, "failed")],
            "total": 3, "limit": 100, "from": 1, "next": null
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [task_json(3, "succeeded"), task_json(2, "processing")],
            "total": 3, "limit": 100, "from": 3, "next": 1
        })))
        .mount(&server)
        .await;

    let stats = collect_task_stats(&client_for(&server, None), &TaskQuery::new()).await.unwrap();

    assert_eq!(stats.total, 3);
    assert_eq!(stats.succeeded, 1);
    assert_eq!(stats.processing, 1);
    assert_eq!(stats.failed, 1);
}

#[tokio::test]
async fn cancel_and_delete_tasks_use_filters_only() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tasks/cancel"))
        .and(query_param("statuses", "enqueued"))
        .respond_with(ResponseTemplate::new(200).set_body_json(enqueued_json(90, None, "taskCancelation")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/tasks"))
        .and(query_param("indexUids", "movies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(enqueued_json(91, None, "taskDeletion")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let canceled = client
        .cancel_tasks(&TaskQuery::new().with_statuses([TaskStatus::Enqueued]).with_limit(5))
        .await
        .unwrap();
    let deleted = client.delete_tasks(&TaskQuery::new().with_index_uids(["movies"])).await.unwrap();

    assert_eq!(canceled.task_uid, TaskUid(90));
    assert_eq!(canceled.task_type, "taskCancelation");
    assert_eq!(deleted.task_uid, TaskUid(91));

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].url.query().is_some_and(|q| !q.contains("limit")));
}

#[tokio::test]
async fn unfiltered_cancel_is_rejected_locally() {
    let server = MockServer::start().await;

    let err = client_for(&server, None).cancel_tasks(&TaskQuery::new()).await.unwrap_err();

    assert!(matches!(err, TaskError::Validation { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn health_reports_availability() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "available" })))
        .mount(&server)
        .await;

    let health = client_for(&server, None).health().await.unwrap();
    assert!(health.is_available());
}

// ============================================================================
// Documents
// ============================================================================

#[tokio::test]
async fn add_documents_posts_json_with_primary_key() {
    let server = MockServer::start().await;
    let documents = vec![json!({ "id": 1, "title": "Carol" }), json!({ "id": 2, "title": "Wall-E" })];
    Mock::given(method("POST"))
        .and(path("/indexes/movies/documents"))
        .and(query_param("primaryKey", "id"))
        .and(body_json(&documents))
        .respond_with(
            ResponseTemplate::new(202)
                .set_body_json(enqueued_json(12, Some("movies"), "documentAdditionOrUpdate")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let task = client_for(&server, None).add_documents("movies", documents, Some("id")).await.unwrap();

    assert_eq!(task.task_uid, TaskUid(12));
    assert_eq!(task.index_uid.as_deref(), Some("movies"));
    assert_eq!(task.status, TaskStatus::Enqueued);
}

#[tokio::test]
async fn update_and_delete_documents_hit_their_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/indexes/movies/documents"))
        .respond_with(
            ResponseTemplate::new(202)
                .set_body_json(enqueued_json(13, Some("movies"), "documentAdditionOrUpdate")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/indexes/movies/documents/delete-batch"))
        .and(body_json(json!([1, 2, 3])))
        .respond_with(
            ResponseTemplate::new(202).set_body_json(enqueued_json(14, Some("movies"), "documentDeletion")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let updated = client.update_documents("movies", vec![json!({ "id": 1 })], None).await.unwrap();
    let deleted = client
        .delete_documents("movies", vec![json!(1), json!(2), json!(3)])
        .await
        .unwrap();

    assert_eq!(updated.task_uid, TaskUid(13));
    assert_eq!(deleted.task_uid, TaskUid(14));
}

#[tokio::test]
async fn write_response_without_task_uid_is_a_validation_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/indexes/movies/documents"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({ "status": "enqueued" })))
        .mount(&server)
        .await;

    let err = client_for(&server, None)
        .add_documents("movies", vec![json!({ "id": 1 })], None)
        .await
        .unwrap_err();

    assert!(matches!(err, TaskError::Validation { .. }));
}

#[tokio::test]
async fn invalid_index_uid_is_rejected_before_sending() {
    let server = MockServer::start().await;

    let err = client_for(&server, None)
        .add_documents("../keys", vec![json!({ "id": 1 })], None)
        .await
        .unwrap_err();

    assert!(matches!(err, TaskError::Validation { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}
