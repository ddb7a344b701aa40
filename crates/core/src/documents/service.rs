use std::sync::Arc;

use futures::stream::Stream;
use meilisync_domain::{BatchOutcome, EnqueuedTask, Result, TaskError};
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use crate::batch::{BatchExecutor, BatchOptions, StreamBatchExecutor};
use crate::documents::ports::DocumentWriter;
use crate::wait::TaskWaiter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteKind {
    Add,
    Update,
}

/// Sends large document sets to an index in sequential chunks.
#[derive(Clone)]
pub struct DocumentBatchService {
    writer: Arc<dyn DocumentWriter>,
    batch: BatchExecutor,
    stream: StreamBatchExecutor,
}

impl DocumentBatchService {
    pub fn new(writer: Arc<dyn DocumentWriter>) -> Self {
        Self { writer, batch: BatchExecutor::new(), stream: StreamBatchExecutor::new() }
    }

    /// Allows `BatchOptions::wait_for_completion`.
    pub fn with_waiter(mut self, waiter: TaskWaiter) -> Self {
        self.batch = BatchExecutor::with_waiter(waiter.clone());
        self.stream = StreamBatchExecutor::with_waiter(waiter);
        self
    }

    #[instrument(skip(self, documents, options), fields(documents = documents.len()))]
    pub async fn add_documents_in_batches<D>(
        &self,
        index_uid: &str,
        documents: &[D],
        primary_key: Option<&str>,
        options: &BatchOptions,
    ) -> Result<BatchOutcome>
    where
        D: Serialize + Clone,
    {
        self.write_in_batches(WriteKind::Add, index_uid, documents, primary_key, options).await
    }

    #[instrument(skip(self, documents, options), fields(documents = documents.len()))]
    pub async fn update_documents_in_batches<D>(
        &self,
        index_uid: &str,
        documents: &[D],
        primary_key: Option<&str>,
        options: &BatchOptions,
    ) -> Result<BatchOutcome>
    where
        D: Serialize + Clone,
    {
        self.write_in_batches(WriteKind::Update, index_uid, documents, primary_key, options).await
    }

    #[instrument(skip(self, ids, options), fields(ids = ids.len()))]
    pub async fn delete_documents_in_batches<I>(
        &self,
        index_uid: &str,
        ids: &[I],
        options: &BatchOptions,
    ) -> Result<BatchOutcome>
    where
        I: Serialize + Clone,
    {
        self.batch
            .run(
                ids,
                |chunk| {
                    let writer = Arc::clone(&self.writer);
                    async move { writer.delete_documents(index_uid, to_values(&chunk)?).await }
                },
                options,
            )
            .await
    }

    /// Streams documents into an index; see [`StreamBatchExecutor::run`].
    pub fn add_documents_from_stream<S, D>(
        &self,
        index_uid: impl Into<String>,
        documents: S,
        primary_key: Option<String>,
        options: BatchOptions,
    ) -> impl Stream<Item = Result<EnqueuedTask>>
    where
        S: Stream<Item = Result<D>>,
        D: Serialize,
    {
        let writer = Arc::clone(&self.writer);
        let index_uid = index_uid.into();
        self.stream.run(
            documents,
            move |chunk: Vec<D>| {
                let writer = Arc::clone(&writer);
                let index_uid = index_uid.clone();
                let primary_key = primary_key.clone();
                async move {
                    writer.add_documents(&index_uid, to_values(&chunk)?, primary_key.as_deref()).await
                }
            },
            options,
        )
    }

    async fn write_in_batches<D>(
        &self,
        kind: WriteKind,
        index_uid: &str,
        documents: &[D],
        primary_key: Option<&str>,
        options: &BatchOptions,
    ) -> Result<BatchOutcome>
    where
        D: Serialize + Clone,
    {
        self.batch
            .run(
                documents,
                |chunk| {
                    let writer = Arc::clone(&self.writer);
                    async move {
                        let documents = to_values(&chunk)?;
                        match kind {
                            WriteKind::Add => {
                                writer.add_documents(index_uid, documents, primary_key).await
                            }
                            WriteKind::Update => {
                                writer.update_documents(index_uid, documents, primary_key).await
                            }
                        }
                    }
                },
                options,
            )
            .await
    }
}

fn to_values<D: Serialize>(items: &[D]) -> Result<Vec<Value>> {
    items.iter().map(serde_json::to_value).collect::<std::result::Result<_, _>>().map_err(TaskError::from)
}
