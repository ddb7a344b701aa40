//! Shared test helpers for `meilisync-core` integration tests.
//!
//! [`ScriptedTaskClient`] replays a fixed sequence of statuses per task and
//! [`RecordingWriter`] captures every document write, so tests can focus on
//! timing and bookkeeping instead of HTTP.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use meilisync_core::{DocumentWriter, TaskStatusClient};
use meilisync_domain::{
    EnqueuedTask, Result as DomainResult, TaskError, TaskPage, TaskQuery, TaskRecord, TaskStatus,
    TaskUid, TransportError,
};
use parking_lot::Mutex;
use serde_json::Value;

/// One scripted response for `get_task`.
#[derive(Debug, Clone)]
pub enum Step {
    Status(TaskStatus),
    Fail(TaskError),
}

impl From<TaskStatus> for Step {
    fn from(status: TaskStatus) -> Self {
        Step::Status(status)
    }
}

/// Network-style failure used to script poll errors.
pub fn unavailable() -> Step {
    Step::Fail(TaskError::Transport(TransportError::http(503, "service unavailable")))
}

struct Script {
    steps: Vec<Step>,
    cursor: usize,
}

impl Script {
    /// Returns the current step and advances; the last step repeats forever.
    fn advance(&mut self) -> Step {
        let step = self.steps[self.cursor].clone();
        if self.cursor + 1 < self.steps.len() {
            self.cursor += 1;
        }
        step
    }
}

/// In-memory `TaskStatusClient` driven by per-task scripts.
///
/// `get_tasks` either serves pages registered with [`with_page`] (keyed by
/// the query's `from`) or, when none are registered, answers for the
/// requested uids from the same scripts `get_task` uses.
///
/// [`with_page`]: ScriptedTaskClient::with_page
#[derive(Default)]
pub struct ScriptedTaskClient {
    scripts: Mutex<HashMap<TaskUid, Script>>,
    pages: Mutex<HashMap<Option<u64>, TaskPage>>,
    get_task_calls: Mutex<HashMap<TaskUid, usize>>,
    page_queries: Mutex<Vec<TaskQuery>>,
    fail_get_tasks: Mutex<Option<TaskError>>,
}

impl ScriptedTaskClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script<I, S>(self, uid: u64, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Step>,
    {
        self.script(uid, steps);
        self
    }

    /// Replaces the script for `uid`.
    pub fn script<I, S>(&self, uid: u64, steps: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<Step>,
    {
        let steps: Vec<Step> = steps.into_iter().map(Into::into).collect();
        assert!(!steps.is_empty(), "a script needs at least one step");
        self.scripts.lock().insert(TaskUid(uid), Script { steps, cursor: 0 });
    }

    pub fn with_page(self, from: Option<u64>, page: TaskPage) -> Self {
        self.pages.lock().insert(from, page);
        self
    }

    pub fn fail_get_tasks(&self, error: Option<TaskError>) {
        *self.fail_get_tasks.lock() = error;
    }

    pub fn get_task_calls(&self, uid: u64) -> usize {
        self.get_task_calls.lock().get(&TaskUid(uid)).copied().unwrap_or(0)
    }

    pub fn page_queries(&self) -> Vec<TaskQuery> {
        self.page_queries.lock().clone()
    }

    fn next_step(&self, uid: TaskUid) -> DomainResult<TaskRecord> {
        let step = match self.scripts.lock().get_mut(&uid) {
            Some(script) => script.advance(),
            None => {
                return Err(TaskError::Transport(TransportError::http(
                    404,
                    format!("Task `{uid}` not found."),
                )))
            }
        };
        match step {
            Step::Status(status) => Ok(TaskRecord::new(uid, status)),
            Step::Fail(error) => Err(error),
        }
    }
}

#[async_trait]
impl TaskStatusClient for ScriptedTaskClient {
    async fn get_task(&self, uid: TaskUid) -> DomainResult<TaskRecord> {
        *self.get_task_calls.lock().entry(uid).or_default() += 1;
        self.next_step(uid)
    }

    async fn get_tasks(&self, query: &TaskQuery) -> DomainResult<TaskPage> {
        self.page_queries.lock().push(query.clone());
        if let Some(error) = self.fail_get_tasks.lock().clone() {
            return Err(error);
        }

        let pages = self.pages.lock();
        if !pages.is_empty() {
            return Ok(pages.get(&query.from).cloned().unwrap_or_default());
        }
        drop(pages);

        let results = query
            .uids
            .iter()
            .map(|uid| self.next_step(*uid))
            .collect::<DomainResult<Vec<_>>>()?;
        Ok(TaskPage { total: Some(results.len() as u64), results, ..TaskPage::default() })
    }
}

/// Which `DocumentWriter` method was called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Add,
    Update,
    Delete,
}

/// A captured `DocumentWriter` call.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteCall {
    pub op: WriteOp,
    pub index_uid: String,
    pub documents: Vec<Value>,
    pub primary_key: Option<String>,
}

/// `DocumentWriter` that records every call and hands out sequential task
/// uids. Calls listed in `failing_calls` (zero-based) return a 500.
#[derive(Default)]
pub struct RecordingWriter {
    calls: Mutex<Vec<WriteCall>>,
    failing_calls: Mutex<Vec<usize>>,
    next_uid: AtomicU64,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(self, calls: impl IntoIterator<Item = usize>) -> Self {
        self.failing_calls.lock().extend(calls);
        self
    }

    pub fn calls(&self) -> Vec<WriteCall> {
        self.calls.lock().clone()
    }

    pub fn chunk_sizes(&self) -> Vec<usize> {
        self.calls.lock().iter().map(|call| call.documents.len()).collect()
    }

    fn record(
        &self,
        op: WriteOp,
        index_uid: &str,
        documents: Vec<Value>,
        primary_key: Option<&str>,
    ) -> DomainResult<EnqueuedTask> {
        let call_index = {
            let mut calls = self.calls.lock();
            calls.push(WriteCall {
                op,
                index_uid: index_uid.to_string(),
                documents,
                primary_key: primary_key.map(str::to_string),
            });
            calls.len() - 1
        };

        if self.failing_calls.lock().contains(&call_index) {
            return Err(TaskError::Transport(TransportError::http(500, "internal error")));
        }
        let mut task = EnqueuedTask::new(self.next_uid.fetch_add(1, Ordering::SeqCst));
        task.index_uid = Some(index_uid.to_string());
        Ok(task)
    }
}

#[async_trait]
impl DocumentWriter for RecordingWriter {
    async fn add_documents(
        &self,
        index_uid: &str,
        documents: Vec<Value>,
        primary_key: Option<&str>,
    ) -> DomainResult<EnqueuedTask> {
        self.record(WriteOp::Add, index_uid, documents, primary_key)
    }

    async fn update_documents(
        &self,
        index_uid: &str,
        documents: Vec<Value>,
        primary_key: Option<&str>,
    ) -> DomainResult<EnqueuedTask> {
        self.record(WriteOp::Update, index_uid, documents, primary_key)
    }

    async fn delete_documents(&self, index_uid: &str, ids: Vec<Value>) -> DomainResult<EnqueuedTask> {
        self.record(WriteOp::Delete, index_uid, ids, None)
    }
}
