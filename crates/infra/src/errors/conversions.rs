//! Conversions from external infrastructure errors into domain errors.

use std::time::Duration;

use meilisync_domain::{TaskError, TaskErrorPayload, TransportError};
use reqwest::Error as HttpError;
use reqwest::StatusCode;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct InfraError(pub TaskError);

impl From<InfraError> for TaskError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<TaskError> for InfraError {
    fn from(value: TaskError) -> Self {
        InfraError(value)
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → TaskError */
/* -------------------------------------------------------------------------- */

/// Maps a reqwest failure, reporting timeouts against `timeout`.
pub fn map_reqwest_error(err: HttpError, timeout: Duration) -> TaskError {
    if err.is_timeout() {
        let url = err.url().map(ToString::to_string).unwrap_or_else(|| "<unknown>".into());
        return TaskError::request_timeout(url, timeout);
    }
    InfraError::from(err).into()
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        if value.is_builder() {
            return InfraError(TaskError::Config(format!("invalid HTTP request: {value}")));
        }

        #[cfg(not(target_arch = "wasm32"))]
        if value.is_connect() {
            return InfraError(TaskError::Transport(TransportError::network(format!(
                "HTTP connection failure: {value}"
            ))));
        }

        if value.is_decode() {
            return InfraError(TaskError::Serialization(format!("invalid response body: {value}")));
        }

        if let Some(status) = value.status() {
            return InfraError(TaskError::Transport(TransportError::http(
                status.as_u16(),
                status_message(status),
            )));
        }

        InfraError(TaskError::Transport(TransportError::network(value.to_string())))
    }
}

/* -------------------------------------------------------------------------- */
/* Error responses → TaskError */
/* -------------------------------------------------------------------------- */

/// Builds the error for a non-success response.
///
/// The remote error payload is used when the body carries one; otherwise the
/// raw body (or the canonical reason) becomes the message.
pub(crate) fn error_from_response(status: StatusCode, body: &str) -> TaskError {
    let transport = match serde_json::from_str::<TaskErrorPayload>(body) {
        Ok(payload) if !payload.message.is_empty() => {
            TransportError::from_payload(status.as_u16(), payload)
        }
        _ if body.trim().is_empty() => TransportError::http(status.as_u16(), status_message(status)),
        _ => TransportError::http(status.as_u16(), body.trim().to_string()),
    };
    TaskError::Transport(transport)
}

fn status_message(status: StatusCode) -> String {
    format!("HTTP {} {}", status.as_u16(), status.canonical_reason().unwrap_or("unknown status"))
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use reqwest::Client;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn payload_fields_are_copied() {
        let body = r#"{
            "message": "Index `movies` not found.",
            "code": "index_not_found",
            "type": "invalid_request",
            "link": "https://docs.meilisearch.com/errors#index_not_found"
        }"#;

        match error_from_response(StatusCode::NOT_FOUND, body) {
            TaskError::Transport(err) => {
                assert_eq!(err.status, Some(404));
                assert_eq!(err.message, "Index `movies` not found.");
                assert_eq!(err.code.as_deref(), Some("index_not_found"));
                assert_eq!(err.kind.as_deref(), Some("invalid_request"));
                assert!(err.link.unwrap().ends_with("#index_not_found"));
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[test]
    fn plain_text_and_empty_bodies_still_produce_a_message() {
        match error_from_response(StatusCode::BAD_GATEWAY, "upstream down\n") {
            TaskError::Transport(err) => assert_eq!(err.message, "upstream down"),
            other => panic!("expected transport error, got {other:?}"),
        }
        match error_from_response(StatusCode::SERVICE_UNAVAILABLE, "") {
            TaskError::Transport(err) => {
                assert_eq!(err.message, "HTTP 503 Service Unavailable");
                assert!(err.is_retryable());
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn http_status_error_maps_to_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::UNAUTHORIZED))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: TaskError = InfraError::from(error).into();
        match mapped {
            TaskError::Transport(err) => {
                assert_eq!(err.status, Some(401));
                assert!(err.message.contains("401"));
                assert!(!err.is_retryable());
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn timeouts_map_to_request_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let timeout = Duration::from_millis(50);
        let client = Client::builder().no_proxy().timeout(timeout).build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap_err();

        match map_reqwest_error(error, timeout) {
            TaskError::Timeout { duration, .. } => assert_eq!(duration, timeout),
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}
