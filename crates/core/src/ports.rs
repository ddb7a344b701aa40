//! Port interfaces for remote task status

use async_trait::async_trait;
use meilisync_domain::{Result, TaskPage, TaskQuery, TaskRecord, TaskUid};

/// Read access to the remote task queue.
#[async_trait]
pub trait TaskStatusClient: Send + Sync {
    /// Fetch the current record of a single task.
    async fn get_task(&self, uid: TaskUid) -> Result<TaskRecord>;

    /// Fetch one page of tasks matching `query`.
    ///
    /// Callers follow [`TaskPage::next`] by re-issuing the query with
    /// `from` set to it until it is `None`.
    async fn get_tasks(&self, query: &TaskQuery) -> Result<TaskPage>;
}
