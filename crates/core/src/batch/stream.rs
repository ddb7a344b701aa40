//! Chunked submission of an unbounded item stream.
//!
//! Items are buffered until a chunk is full, then submitted. The buffer is
//! taken before each submission, so no item is ever sent twice; when the
//! source stream fails, whatever is buffered is flushed exactly once before
//! the failure is reported.

use std::future::Future;
use std::mem;
use std::pin::Pin;

use futures::stream::{self, Stream, StreamExt};
use meilisync_domain::{BatchOutcome, EnqueuedTask, Result, TaskError};
use tracing::{info, warn};

use crate::batch::executor::{record_chunk, resolve_waiter, submit_chunk};
use crate::batch::options::BatchOptions;
use crate::wait::TaskWaiter;

/// Stream counterpart of [`BatchExecutor`](super::BatchExecutor).
#[derive(Clone, Default)]
pub struct StreamBatchExecutor {
    waiter: Option<TaskWaiter>,
}

enum Phase {
    Reading,
    SourceFailed(TaskError),
    Exhausted,
    Done,
}

struct RunState<S, T, F> {
    source: Pin<Box<S>>,
    buffer: Vec<T>,
    next_index: usize,
    outcome: BatchOutcome,
    submit: F,
    options: BatchOptions,
    waiter: Option<TaskWaiter>,
    phase: Phase,
}

impl<S, T, F, Fut> RunState<S, T, F>
where
    S: Stream<Item = Result<T>>,
    F: FnMut(Vec<T>) -> Fut,
    Fut: Future<Output = Result<EnqueuedTask>>,
{
    /// Submits the buffered items, if any. Returns the handle on success.
    async fn flush(&mut self) -> Option<EnqueuedTask> {
        if self.buffer.is_empty() {
            return None;
        }
        let chunk = mem::take(&mut self.buffer);
        let index = self.next_index;
        self.next_index += 1;

        let result =
            submit_chunk(self.waiter.as_ref(), index, chunk, &mut self.submit, &self.options).await;
        let task = result.as_ref().ok().cloned();
        record_chunk(&mut self.outcome, &self.options, index, result);
        task
    }

    async fn step(&mut self) -> Option<Result<EnqueuedTask>> {
        loop {
            match mem::replace(&mut self.phase, Phase::Done) {
                Phase::Reading => match self.source.next().await {
                    Some(Ok(item)) => {
                        self.phase = Phase::Reading;
                        self.buffer.push(item);
                        if self.buffer.len() >= self.options.chunk_size {
                            if let Some(task) = self.flush().await {
                                return Some(Ok(task));
                            }
                        }
                    }
                    Some(Err(error)) => {
                        warn!(error = %error, buffered = self.buffer.len(), "source stream failed");
                        self.phase = Phase::SourceFailed(error);
                        if let Some(task) = self.flush().await {
                            return Some(Ok(task));
                        }
                    }
                    None => {
                        self.phase = Phase::Exhausted;
                        if let Some(task) = self.flush().await {
                            return Some(Ok(task));
                        }
                    }
                },
                Phase::SourceFailed(error) => {
                    let outcome = mem::take(&mut self.outcome);
                    return Some(Err(TaskError::batch(outcome, Some(error))));
                }
                Phase::Exhausted => {
                    info!(
                        total = self.outcome.total_chunks(),
                        failed = self.outcome.failed_chunks(),
                        "stream batch run finished"
                    );
                    if self.outcome.has_failures() {
                        let outcome = mem::take(&mut self.outcome);
                        return Some(Err(TaskError::batch(outcome, None)));
                    }
                    return None;
                }
                Phase::Done => return None,
            }
        }
    }
}

impl StreamBatchExecutor {
    /// Executor that submits chunks without waiting on their tasks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables `wait_for_completion` by supplying a waiter.
    pub fn with_waiter(waiter: TaskWaiter) -> Self {
        Self { waiter: Some(waiter) }
    }

    /// Buffers `source` into chunks and submits each through `submit`.
    ///
    /// The returned stream yields one handle per accepted chunk. If any chunk
    /// failed, or the source failed, its last item is a `TaskError::Batch`
    /// describing the whole run; nothing follows it. Invalid options surface
    /// as a single error item.
    pub fn run<S, T, F, Fut>(
        &self,
        source: S,
        submit: F,
        options: BatchOptions,
    ) -> impl Stream<Item = Result<EnqueuedTask>>
    where
        S: Stream<Item = Result<T>>,
        F: FnMut(Vec<T>) -> Fut,
        Fut: Future<Output = Result<EnqueuedTask>>,
    {
        let setup = if options.chunk_size == 0 {
            Err(TaskError::validation("chunk size must be at least 1"))
        } else {
            resolve_waiter(self.waiter.as_ref(), &options).map(|waiter| waiter.cloned())
        };

        let (phase, waiter, setup_error) = match setup {
            Ok(waiter) => (Phase::Reading, waiter, None),
            Err(error) => (Phase::Done, None, Some(error)),
        };
        let state = RunState {
            source: Box::pin(source),
            buffer: Vec::with_capacity(options.chunk_size.min(1024)),
            next_index: 0,
            outcome: BatchOutcome::new(),
            submit,
            options,
            waiter,
            phase,
        };

        let items = stream::unfold(state, |mut state| async move {
            let item = state.step().await?;
            Some((item, state))
        });
        stream::iter(setup_error.map(Err)).chain(items)
    }

    /// Drives [`run`](Self::run) to completion and returns the outcome.
    pub async fn collect_outcome<S, T, F, Fut>(
        &self,
        source: S,
        submit: F,
        options: BatchOptions,
    ) -> Result<BatchOutcome>
    where
        S: Stream<Item = Result<T>>,
        F: FnMut(Vec<T>) -> Fut,
        Fut: Future<Output = Result<EnqueuedTask>>,
    {
        let run = self.run(source, submit, options);
        futures::pin_mut!(run);

        let mut outcome = BatchOutcome::new();
        while let Some(item) = run.next().await {
            // any failed chunk ends the stream with an aggregate error, so
            // accepted chunks arrive with consecutive indices
            outcome.record_success(outcome.total_chunks(), item?);
        }
        Ok(outcome)
    }
}
