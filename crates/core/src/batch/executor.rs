//! Sequential chunk submission with per-chunk failure isolation.

use std::future::Future;

use meilisync_domain::{BatchOutcome, EnqueuedTask, Result, TaskError};
use tracing::{debug, info, instrument, warn};

use crate::batch::options::BatchOptions;
use crate::batch::planner::plan_chunks;
use crate::wait::TaskWaiter;

/// Submits chunks one after another, never in parallel.
///
/// A failed chunk is recorded and the run continues with the next one; work
/// already accepted by the remote system is never rolled back.
#[derive(Clone, Default)]
pub struct BatchExecutor {
    waiter: Option<TaskWaiter>,
}

impl BatchExecutor {
    /// Executor that submits chunks without waiting on their tasks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables `wait_for_completion` by supplying a waiter.
    pub fn with_waiter(waiter: TaskWaiter) -> Self {
        Self { waiter: Some(waiter) }
    }

    /// Submits `items` chunk by chunk through `submit`.
    ///
    /// # Errors
    /// - `TaskError::Validation` for a zero chunk size
    /// - `TaskError::Config` when waiting is requested without a waiter
    /// - `TaskError::Batch` when at least one chunk failed; the error carries
    ///   the failed and successful chunk indices
    #[instrument(skip_all, fields(items = items.len(), chunk_size = options.chunk_size))]
    pub async fn run<T, F, Fut>(
        &self,
        items: &[T],
        mut submit: F,
        options: &BatchOptions,
    ) -> Result<BatchOutcome>
    where
        T: Clone,
        F: FnMut(Vec<T>) -> Fut,
        Fut: Future<Output = Result<EnqueuedTask>>,
    {
        let plan = plan_chunks(items, options.chunk_size)?;
        let waiter = resolve_waiter(self.waiter.as_ref(), options)?;
        info!(chunks = plan.len(), "starting batch run");

        let mut outcome = BatchOutcome::new();
        for (index, chunk) in plan.enumerate() {
            let result = submit_chunk(waiter, index, chunk.to_vec(), &mut submit, options).await;
            record_chunk(&mut outcome, options, index, result);
        }

        info!(
            total = outcome.total_chunks(),
            failed = outcome.failed_chunks(),
            "batch run finished"
        );
        outcome.into_result()
    }
}

pub(crate) fn resolve_waiter<'a>(
    waiter: Option<&'a TaskWaiter>,
    options: &BatchOptions,
) -> Result<Option<&'a TaskWaiter>> {
    match (options.wait_for_completion, waiter) {
        (false, _) => Ok(None),
        (true, Some(waiter)) => Ok(Some(waiter)),
        (true, None) => Err(TaskError::Config(
            "wait_for_completion requires an executor built with a TaskWaiter".into(),
        )),
    }
}

/// Submits one chunk and, when requested, waits for its task to finish.
pub(crate) async fn submit_chunk<T, F, Fut>(
    waiter: Option<&TaskWaiter>,
    index: usize,
    chunk: Vec<T>,
    submit: &mut F,
    options: &BatchOptions,
) -> Result<EnqueuedTask>
where
    F: FnMut(Vec<T>) -> Fut,
    Fut: Future<Output = Result<EnqueuedTask>>,
{
    let size = chunk.len();
    let task = submit(chunk).await?;
    debug!(index, size, task_uid = %task.task_uid, "chunk accepted");

    if let Some(waiter) = waiter {
        let record = waiter.wait_for(task.task_uid, &options.wait).await?;
        if record.status.is_failure() {
            return Err(TaskError::TaskFailed {
                uid: record.uid,
                status: record.status,
                error: record.error,
            });
        }
    }
    Ok(task)
}

pub(crate) fn record_chunk(
    outcome: &mut BatchOutcome,
    options: &BatchOptions,
    index: usize,
    result: Result<EnqueuedTask>,
) -> bool {
    match result {
        Ok(task) => {
            options.notify_complete(index, &task);
            outcome.record_success(index, task);
            true
        }
        Err(error) => {
            warn!(index, error = %error, "chunk failed");
            options.notify_error(index, &error);
            outcome.record_failure(index, error);
            false
        }
    }
}
