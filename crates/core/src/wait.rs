//! Waiting for tasks to reach a terminal status.
//!
//! Polling starts at [`WaitOptions::interval`] and grows by
//! [`WaitOptions::backoff_factor`] per unfinished poll, capped at
//! [`WaitOptions::max_interval`]. A task that ends `failed` or `canceled`
//! resolves normally; only the timeout and transport errors fail the wait.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, Stream, StreamExt};
use meilisync_common::resilience::{Backoff, BackoffStrategy};
use meilisync_domain::{Result, TaskError, TaskRecord, TaskUid, WaitConfig};
use tracing::{debug, instrument};

use crate::ports::TaskStatusClient;

/// Timing for a single wait.
#[derive(Debug, Clone, PartialEq)]
pub struct WaitOptions {
    pub timeout: Duration,
    pub interval: Duration,
    pub max_interval: Duration,
    pub backoff_factor: f64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::from(&WaitConfig::default())
    }
}

impl From<&WaitConfig> for WaitOptions {
    fn from(config: &WaitConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.timeout_ms),
            interval: Duration::from_millis(config.interval_ms),
            max_interval: Duration::from_millis(config.max_interval_ms),
            backoff_factor: config.backoff_factor,
        }
    }
}

impl WaitOptions {
    /// Overall deadline for the wait.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Delay before the second poll; later delays grow from here.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Rejects timings that would poll without pausing.
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() || self.max_interval.is_zero() {
            return Err(TaskError::validation("wait interval must be greater than zero"));
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err(TaskError::validation(format!(
                "wait backoff factor must be at least 1.0, got {}",
                self.backoff_factor
            )));
        }
        Ok(())
    }

    fn backoff(&self) -> Backoff {
        Backoff::new(BackoffStrategy::exponential(
            self.interval,
            self.backoff_factor,
            self.max_interval,
        ))
    }
}

/// Polls a [`TaskStatusClient`] until tasks finish.
#[derive(Clone)]
pub struct TaskWaiter {
    client: Arc<dyn TaskStatusClient>,
    defaults: WaitOptions,
}

impl TaskWaiter {
    /// Waiter using [`WaitOptions::default`].
    pub fn new(client: Arc<dyn TaskStatusClient>) -> Self {
        Self { client, defaults: WaitOptions::default() }
    }

    /// Replaces the options used by [`TaskWaiter::wait`].
    pub fn with_defaults(mut self, defaults: WaitOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn defaults(&self) -> &WaitOptions {
        &self.defaults
    }

    /// Waits for one task using the configured defaults.
    pub async fn wait(&self, uid: impl Into<TaskUid>) -> Result<TaskRecord> {
        self.wait_one(uid.into(), &self.defaults).await
    }

    /// Waits for one task.
    ///
    /// # Errors
    /// `TaskError::Validation` when `options` fail [`WaitOptions::validate`].
    /// `TaskError::Timeout` when the task is still active after
    /// `options.timeout`; transport errors from the client are returned as-is.
    pub async fn wait_for(&self, uid: impl Into<TaskUid>, options: &WaitOptions) -> Result<TaskRecord> {
        self.wait_one(uid.into(), options).await
    }

    /// Waits for every task concurrently; results are in completion order.
    ///
    /// Duplicate ids are waited on once. The first error aborts the remaining
    /// waits.
    pub async fn wait_for_many<I>(&self, uids: I, options: &WaitOptions) -> Result<Vec<TaskRecord>>
    where
        I: IntoIterator,
        I::Item: Into<TaskUid>,
    {
        let pending = self.wait_for_many_stream(uids, options);
        futures::pin_mut!(pending);

        let mut records = Vec::new();
        while let Some(result) = pending.next().await {
            records.push(result?);
        }
        Ok(records)
    }

    /// Streams each task's terminal record as soon as it is observed.
    pub fn wait_for_many_stream<'a, I>(
        &'a self,
        uids: I,
        options: &'a WaitOptions,
    ) -> impl Stream<Item = Result<TaskRecord>> + 'a
    where
        I: IntoIterator,
        I::Item: Into<TaskUid>,
    {
        let mut seen = HashSet::new();
        uids.into_iter()
            .map(Into::into)
            .filter(|uid| seen.insert(*uid))
            .map(|uid| self.wait_one(uid, options))
            .collect::<FuturesUnordered<_>>()
    }

    #[instrument(skip(self, options), fields(timeout_ms = options.timeout.as_millis() as u64))]
    async fn wait_one(&self, uid: TaskUid, options: &WaitOptions) -> Result<TaskRecord> {
        options.validate()?;
        let poll = async {
            let mut backoff = options.backoff();
            loop {
                let record = self.client.get_task(uid).await?;
                if record.is_terminal() {
                    debug!(status = %record.status, polls = backoff.attempt() + 1, "task finished");
                    return Ok(record);
                }
                backoff.wait().await;
            }
        };

        match tokio::time::timeout(options.timeout, poll).await {
            Ok(result) => result,
            Err(_) => Err(TaskError::task_timeout(uid, options.timeout)),
        }
    }
}
