//! Remote task records and handles.
//!
//! Field names follow the MeiliSearch task API (`taskUid`, `indexUid`,
//! `enqueuedAt`, ...). Only the id, the status enum and the error payload are
//! relied upon by the library; the remaining fields are carried through.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::TaskError;

/// Numeric identifier assigned by the remote system when a task is enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskUid(pub u64);

impl TaskUid {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TaskUid {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<&EnqueuedTask> for TaskUid {
    fn from(task: &EnqueuedTask) -> Self {
        task.task_uid
    }
}

impl From<EnqueuedTask> for TaskUid {
    fn from(task: EnqueuedTask) -> Self {
        task.task_uid
    }
}

impl From<&TaskRecord> for TaskUid {
    fn from(record: &TaskRecord) -> Self {
        record.uid
    }
}

/// Lifecycle state of a remote task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    #[default]
    Enqueued,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Enqueued,
        TaskStatus::Processing,
        TaskStatus::Succeeded,
        TaskStatus::Failed,
        TaskStatus::Canceled,
    ];

    /// Terminal states never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Canceled)
    }

    pub fn is_failure(self) -> bool {
        matches!(self, TaskStatus::Failed | TaskStatus::Canceled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Enqueued => "enqueued",
            TaskStatus::Processing => "processing",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed => "failed",
            TaskStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enqueued" => Ok(TaskStatus::Enqueued),
            "processing" => Ok(TaskStatus::Processing),
            "succeeded" => Ok(TaskStatus::Succeeded),
            "failed" => Ok(TaskStatus::Failed),
            "canceled" => Ok(TaskStatus::Canceled),
            other => Err(TaskError::validation(format!("unknown task status '{other}'"))),
        }
    }
}

/// Error payload attached to a failed task or returned by a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskErrorPayload {
    pub message: String,
    #[serde(default)]
    pub code: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub link: String,
}

/// Full status record of a task as returned by `GET /tasks/{uid}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub uid: TaskUid,
    #[serde(default)]
    pub index_uid: Option<String>,
    pub status: TaskStatus,
    #[serde(rename = "type", default)]
    pub task_type: String,
    pub enqueued_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error: Option<TaskErrorPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl TaskRecord {
    /// Minimal record, mostly useful for fakes and fixtures.
    pub fn new(uid: impl Into<TaskUid>, status: TaskStatus) -> Self {
        Self {
            uid: uid.into(),
            index_uid: None,
            status,
            task_type: String::new(),
            enqueued_at: Utc::now(),
            started_at: None,
            finished_at: None,
            error: None,
            details: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Summary returned when a write is accepted and a task enqueued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueuedTask {
    pub task_uid: TaskUid,
    #[serde(default)]
    pub index_uid: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(rename = "type", default)]
    pub task_type: String,
    #[serde(default)]
    pub enqueued_at: Option<DateTime<Utc>>,
}

impl EnqueuedTask {
    pub fn new(uid: impl Into<TaskUid>) -> Self {
        Self {
            task_uid: uid.into(),
            index_uid: None,
            status: TaskStatus::Enqueued,
            task_type: String::new(),
            enqueued_at: None,
        }
    }

    /// Builds a handle from an untyped response body.
    ///
    /// Accepts `taskUid` and falls back to `uid`; the id must be a
    /// non-negative integer.
    pub fn from_response(value: Value) -> Result<Self, TaskError> {
        let uid = value
            .get("taskUid")
            .or_else(|| value.get("uid"))
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                TaskError::validation("invalid operation response: missing numeric taskUid")
            })?;

        let index_uid = value.get("indexUid").and_then(Value::as_str).map(str::to_owned);
        let status = value
            .get("status")
            .and_then(Value::as_str)
            .map(str::parse::<TaskStatus>)
            .transpose()?
            .unwrap_or_default();
        let task_type =
            value.get("type").and_then(Value::as_str).map(str::to_owned).unwrap_or_default();
        let enqueued_at = value
            .get("enqueuedAt")
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|at| at.with_timezone(&Utc));

        Ok(Self { task_uid: TaskUid(uid), index_uid, status, task_type, enqueued_at })
    }
}
