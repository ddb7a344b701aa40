//! Bulk status queries against `/tasks`.

use serde::{Deserialize, Serialize};

use crate::types::task::{TaskRecord, TaskStatus, TaskUid};

/// Filter for a paginated task listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub uids: Vec<TaskUid>,
    pub statuses: Vec<TaskStatus>,
    pub index_uids: Vec<String>,
    pub types: Vec<String>,
    pub limit: Option<u32>,
    pub from: Option<u64>,
}

impl TaskQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_uids(uids: impl IntoIterator<Item = TaskUid>) -> Self {
        Self { uids: uids.into_iter().collect(), ..Self::default() }
    }

    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = TaskStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    pub fn with_index_uids<S: Into<String>>(mut self, index_uids: impl IntoIterator<Item = S>) -> Self {
        self.index_uids = index_uids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_types<S: Into<String>>(mut self, types: impl IntoIterator<Item = S>) -> Self {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn starting_from(mut self, from: Option<u64>) -> Self {
        self.from = from;
        self
    }

    /// Query-string pairs in MeiliSearch form (comma separated lists).
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if !self.uids.is_empty() {
            pairs.push(("uids", join(self.uids.iter().map(ToString::to_string))));
        }
        if !self.statuses.is_empty() {
            pairs.push(("statuses", join(self.statuses.iter().map(|s| s.as_str().to_owned()))));
        }
        if !self.index_uids.is_empty() {
            pairs.push(("indexUids", self.index_uids.join(",")));
        }
        if !self.types.is_empty() {
            pairs.push(("types", self.types.join(",")));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(from) = self.from {
            pairs.push(("from", from.to_string()));
        }
        pairs
    }
}

fn join(values: impl Iterator<Item = String>) -> String {
    values.collect::<Vec<_>>().join(",")
}

/// One page of `GET /tasks`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPage {
    pub results: Vec<TaskRecord>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub from: Option<u64>,
    #[serde(default)]
    pub next: Option<u64>,
}

/// Per-status counts over a set of tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: usize,
    pub enqueued: usize,
    pub processing: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub canceled: usize,
}

impl TaskStats {
    pub fn record(&mut self, status: TaskStatus) {
        self.total += 1;
        match status {
            TaskStatus::Enqueued => self.enqueued += 1,
            TaskStatus::Processing => self.processing += 1,
            TaskStatus::Succeeded => self.succeeded += 1,
            TaskStatus::Failed => self.failed += 1,
            TaskStatus::Canceled => self.canceled += 1,
        }
    }

    pub fn active(&self) -> usize {
        self.enqueued + self.processing
    }
}
