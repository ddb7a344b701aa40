use std::fmt;
use std::sync::Arc;

use meilisync_domain::constants::DEFAULT_MEMORY_BUDGET_MB;
use meilisync_domain::{BatchConfig, EnqueuedTask, TaskError};
use serde::Serialize;

use crate::batch::planner::estimate_chunk_size;
use crate::wait::WaitOptions;

pub type ChunkCompleteCallback = Arc<dyn Fn(usize, &EnqueuedTask) + Send + Sync>;
pub type ChunkErrorCallback = Arc<dyn Fn(usize, &TaskError) + Send + Sync>;

/// Options shared by [`BatchExecutor`](super::BatchExecutor) and
/// [`StreamBatchExecutor`](super::StreamBatchExecutor).
#[derive(Clone)]
pub struct BatchOptions {
    pub chunk_size: usize,
    /// Block after each accepted chunk until its task is terminal.
    pub wait_for_completion: bool,
    pub wait: WaitOptions,
    on_chunk_complete: Option<ChunkCompleteCallback>,
    on_chunk_error: Option<ChunkErrorCallback>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::from(&BatchConfig::default())
    }
}

impl From<&BatchConfig> for BatchOptions {
    fn from(config: &BatchConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            wait_for_completion: config.wait_for_completion,
            wait: WaitOptions::default(),
            on_chunk_complete: None,
            on_chunk_error: None,
        }
    }
}

impl BatchOptions {
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size, ..Self::default() }
    }

    /// Sizes chunks from a sample of the documents to be sent.
    pub fn auto_sized<T: Serialize>(sample: &[T], memory_budget_mb: Option<f64>) -> Self {
        let budget = memory_budget_mb.unwrap_or(DEFAULT_MEMORY_BUDGET_MB);
        Self::new(estimate_chunk_size(sample, budget))
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn wait_for_completion(mut self, wait: WaitOptions) -> Self {
        self.wait_for_completion = true;
        self.wait = wait;
        self
    }

    pub fn on_chunk_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, &EnqueuedTask) + Send + Sync + 'static,
    {
        self.on_chunk_complete = Some(Arc::new(callback));
        self
    }

    pub fn on_chunk_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, &TaskError) + Send + Sync + 'static,
    {
        self.on_chunk_error = Some(Arc::new(callback));
        self
    }

    pub(crate) fn notify_complete(&self, index: usize, task: &EnqueuedTask) {
        if let Some(callback) = &self.on_chunk_complete {
            callback(index, task);
        }
    }

    pub(crate) fn notify_error(&self, index: usize, error: &TaskError) {
        if let Some(callback) = &self.on_chunk_error {
            callback(index, error);
        }
    }
}

impl fmt::Debug for BatchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchOptions")
            .field("chunk_size", &self.chunk_size)
            .field("wait_for_completion", &self.wait_for_completion)
            .field("wait", &self.wait)
            .field("on_chunk_complete", &self.on_chunk_complete.is_some())
            .field("on_chunk_error", &self.on_chunk_error.is_some())
            .finish()
    }
}
