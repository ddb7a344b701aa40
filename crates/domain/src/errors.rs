//! Error types used throughout the library

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::types::batch::{BatchOutcome, ChunkError};
use crate::types::task::{TaskErrorPayload, TaskStatus, TaskUid};

/// Main error type for meilisync
#[derive(Error, Debug, Clone)]
pub enum TaskError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Timeout waiting for {target} after {}ms", .duration.as_millis())]
    Timeout { target: TimeoutTarget, duration: Duration },

    #[error("{0}")]
    Batch(Box<BatchFailure>),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Task {uid} finished with status {status}{}", describe_payload(.error.as_ref()))]
    TaskFailed { uid: TaskUid, status: TaskStatus, error: Option<TaskErrorPayload> },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for meilisync operations
pub type Result<T> = std::result::Result<T, TaskError>;

impl TaskError {
    pub fn validation(message: impl Into<String>) -> Self {
        TaskError::Validation { message: message.into() }
    }

    pub fn task_timeout(uid: TaskUid, duration: Duration) -> Self {
        TaskError::Timeout { target: TimeoutTarget::Task(uid), duration }
    }

    pub fn request_timeout(url: impl Into<String>, duration: Duration) -> Self {
        TaskError::Timeout { target: TimeoutTarget::Request(url.into()), duration }
    }

    pub fn batch(outcome: BatchOutcome, stream_error: Option<TaskError>) -> Self {
        TaskError::Batch(Box::new(BatchFailure { outcome, stream_error }))
    }

    pub fn as_batch_failure(&self) -> Option<&BatchFailure> {
        match self {
            TaskError::Batch(failure) => Some(failure),
            _ => None,
        }
    }

    /// Transport failures worth another attempt: network errors, 429, 5xx,
    /// and client-side timeouts.
    pub fn is_retryable(&self) -> bool {
        match self {
            TaskError::Transport(err) => err.is_retryable(),
            TaskError::Timeout { .. } => true,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for TaskError {
    fn from(value: serde_json::Error) -> Self {
        TaskError::Serialization(value.to_string())
    }
}

fn describe_payload(payload: Option<&TaskErrorPayload>) -> String {
    payload.map(|p| format!(": {} ({})", p.message, p.code)).unwrap_or_default()
}

/// What a [`TaskError::Timeout`] was waiting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeoutTarget {
    Task(TaskUid),
    Request(String),
}

impl fmt::Display for TimeoutTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutTarget::Task(uid) => write!(f, "task {uid}"),
            TimeoutTarget::Request(url) => write!(f, "request {url}"),
        }
    }
}

/// Failure reported by the remote API or the network below it.
///
/// `status` is absent for network-level failures; `code`, `kind` and `link`
/// are copied verbatim from the remote error payload when one is present.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Transport error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
pub struct TransportError {
    pub message: String,
    pub status: Option<u16>,
    pub code: Option<String>,
    pub kind: Option<String>,
    pub link: Option<String>,
}

impl TransportError {
    pub fn network(message: impl Into<String>) -> Self {
        Self { message: message.into(), status: None, code: None, kind: None, link: None }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self { message: message.into(), status: Some(status), code: None, kind: None, link: None }
    }

    pub fn from_payload(status: u16, payload: TaskErrorPayload) -> Self {
        fn non_empty(value: String) -> Option<String> {
            (!value.is_empty()).then_some(value)
        }

        Self {
            message: payload.message,
            status: Some(status),
            code: non_empty(payload.code),
            kind: non_empty(payload.kind),
            link: non_empty(payload.link),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self.status {
            None => true,
            Some(status) => status == 429 || (500..600).contains(&status),
        }
    }
}

/// Aggregate failure of a batch run.
#[derive(Debug, Clone)]
pub struct BatchFailure {
    outcome: BatchOutcome,
    stream_error: Option<TaskError>,
}

impl BatchFailure {
    pub fn outcome(&self) -> &BatchOutcome {
        &self.outcome
    }

    pub fn into_outcome(self) -> BatchOutcome {
        self.outcome
    }

    pub fn failed_batches(&self) -> Vec<usize> {
        self.outcome.failed_indices()
    }

    pub fn successful_batches(&self) -> Vec<usize> {
        self.outcome.successful_indices()
    }

    pub fn errors(&self) -> &[ChunkError] {
        self.outcome.chunk_errors()
    }

    /// Upstream failure that ended a streaming run early.
    pub fn stream_error(&self) -> Option<&TaskError> {
        self.stream_error.as_ref()
    }
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} batches failed (failed: {:?}, succeeded: {:?})",
            self.outcome.failed_chunks(),
            self.outcome.total_chunks(),
            self.failed_batches(),
            self.successful_batches(),
        )?;
        if let Some(err) = &self.stream_error {
            write!(f, "; source stream failed: {err}")?;
        }
        Ok(())
    }
}
