//! Port interfaces for document writes

use async_trait::async_trait;
use meilisync_domain::{EnqueuedTask, Result};
use serde_json::Value;

/// Write access to an index. Every call enqueues one remote task.
#[async_trait]
pub trait DocumentWriter: Send + Sync {
    /// Add documents, replacing existing documents with the same id.
    async fn add_documents(
        &self,
        index_uid: &str,
        documents: Vec<Value>,
        primary_key: Option<&str>,
    ) -> Result<EnqueuedTask>;

    /// Add documents, merging fields into existing documents with the same id.
    async fn update_documents(
        &self,
        index_uid: &str,
        documents: Vec<Value>,
        primary_key: Option<&str>,
    ) -> Result<EnqueuedTask>;

    /// Delete documents by id.
    async fn delete_documents(&self, index_uid: &str, ids: Vec<Value>) -> Result<EnqueuedTask>;
}
