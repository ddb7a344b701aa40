//! Batch submission bookkeeping.

use crate::errors::TaskError;
use crate::types::task::EnqueuedTask;

/// Handle returned for a chunk that was accepted by the remote system.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedChunk {
    pub index: usize,
    pub task: EnqueuedTask,
}

/// Failure recorded for a single chunk.
#[derive(Debug, Clone)]
pub struct ChunkError {
    pub index: usize,
    pub error: TaskError,
}

/// Summary of a batch run.
///
/// `successful_chunks + failed_chunks == total_chunks` always holds; the
/// recording methods are the only way to change the counters.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    total_chunks: usize,
    successful_chunks: usize,
    failed_chunks: usize,
    submitted: Vec<SubmittedChunk>,
    chunk_errors: Vec<ChunkError>,
}

impl BatchOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, index: usize, task: EnqueuedTask) {
        self.total_chunks += 1;
        self.successful_chunks += 1;
        self.submitted.push(SubmittedChunk { index, task });
    }

    pub fn record_failure(&mut self, index: usize, error: TaskError) {
        self.total_chunks += 1;
        self.failed_chunks += 1;
        self.chunk_errors.push(ChunkError { index, error });
    }

    pub fn total_chunks(&self) -> usize {
        self.total_chunks
    }

    pub fn successful_chunks(&self) -> usize {
        self.successful_chunks
    }

    pub fn failed_chunks(&self) -> usize {
        self.failed_chunks
    }

    pub fn has_failures(&self) -> bool {
        self.failed_chunks > 0
    }

    /// Accepted chunks in submission order.
    pub fn submitted(&self) -> &[SubmittedChunk] {
        &self.submitted
    }

    /// Failed chunks in the order they failed.
    pub fn chunk_errors(&self) -> &[ChunkError] {
        &self.chunk_errors
    }

    pub fn tasks(&self) -> impl Iterator<Item = &EnqueuedTask> {
        self.submitted.iter().map(|chunk| &chunk.task)
    }

    pub fn successful_indices(&self) -> Vec<usize> {
        self.submitted.iter().map(|chunk| chunk.index).collect()
    }

    pub fn failed_indices(&self) -> Vec<usize> {
        self.chunk_errors.iter().map(|chunk| chunk.index).collect()
    }

    /// Converts a run with any failed chunk into [`TaskError::Batch`].
    pub fn into_result(self) -> Result<Self, TaskError> {
        if self.has_failures() {
            Err(TaskError::batch(self, None))
        } else {
            Ok(self)
        }
    }
}
