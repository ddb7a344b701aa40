//! Task tracker with explicit lifecycle management.
//!
//! Every tracked task that is not yet terminal gets its own polling task on
//! the tokio runtime. A background cleanup task trims finished entries and an
//! optional refresh task re-reads all active tasks in one bulk query. All of
//! them hang off a single `CancellationToken`, so [`TaskTracker::destroy`]
//! stops everything at once.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use meilisync_core::{TaskStatusClient, TaskTracker};
//! use meilisync_domain::TrackerConfig;
//!
//! # async fn example(client: Arc<dyn TaskStatusClient>) -> meilisync_domain::Result<()> {
//! let tracker = TaskTracker::start(client, TrackerConfig::default())?;
//! tracker.on_complete(|record| println!("task {} is {}", record.uid, record.status));
//!
//! tracker.add_task(42).await?;
//! // ... application runs ...
//! tracker.destroy();
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use meilisync_common::resilience::{Backoff, BackoffStrategy};
use meilisync_domain::constants::REFRESH_BACKOFF_FACTOR;
use meilisync_domain::{
    EnqueuedTask, Result, TaskError, TaskQuery, TaskRecord, TaskUid, TrackerConfig,
};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::ports::TaskStatusClient;
use crate::stats::fetch_all_tasks;
use crate::tracker::registry::{PollFailure, TaskRegistry, Transition, TrackedTask};

type CompletionCallback = Arc<dyn Fn(&TaskRecord) + Send + Sync>;

/// Handle returned by [`TaskTracker::on_complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Poller {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct TrackerState {
    registry: TaskRegistry,
    pollers: HashMap<TaskUid, Poller>,
}

struct TrackerInner {
    client: Arc<dyn TaskStatusClient>,
    config: TrackerConfig,
    state: Mutex<TrackerState>,
    subscribers: Mutex<Vec<(SubscriptionId, CompletionCallback)>>,
    next_subscription: AtomicU64,
    shutdown: CancellationToken,
    destroyed: AtomicBool,
    background: Mutex<Vec<JoinHandle<()>>>,
}

/// Tracks remote tasks until they finish and notifies subscribers.
///
/// Dropping the tracker destroys it.
pub struct TaskTracker {
    inner: Arc<TrackerInner>,
}

impl TaskTracker {
    /// Creates a tracker and spawns its background cleanup (and, when
    /// configured, refresh) tasks.
    ///
    /// # Errors
    /// `TaskError::Config` when called outside a tokio runtime or when an
    /// interval in `config` is zero.
    pub fn start(client: Arc<dyn TaskStatusClient>, config: TrackerConfig) -> Result<Self> {
        tokio::runtime::Handle::try_current().map_err(|_| {
            TaskError::Config("TaskTracker::start must be called within a tokio runtime".into())
        })?;
        validate(&config)?;

        let inner = Arc::new(TrackerInner {
            client,
            config,
            state: Mutex::new(TrackerState::default()),
            subscribers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
            shutdown: CancellationToken::new(),
            destroyed: AtomicBool::new(false),
            background: Mutex::new(Vec::new()),
        });

        let mut background = Vec::with_capacity(2);
        background.push(tokio::spawn(
            Arc::clone(&inner).cleanup_loop(inner.shutdown.child_token()),
        ));
        if let Some(period) = inner.config.refresh_interval() {
            background.push(tokio::spawn(
                Arc::clone(&inner).refresh_loop(period, inner.shutdown.child_token()),
            ));
        }
        *inner.background.lock() = background;

        info!(
            poll_interval_ms = inner.config.poll_interval_ms,
            refresh = inner.config.refresh_interval_ms.is_some(),
            "task tracker started"
        );
        Ok(Self { inner })
    }

    /// Starts tracking `uid`.
    ///
    /// The task is fetched immediately. A task that is already terminal is
    /// stored as completed without notifying subscribers; otherwise a polling
    /// loop is started unless one is already running for this uid.
    ///
    /// # Errors
    /// Returns the fetch error when the initial lookup fails; nothing is
    /// tracked in that case.
    #[instrument(skip(self, uid))]
    pub async fn add_task(&self, uid: impl Into<TaskUid>) -> Result<TaskRecord> {
        let uid = uid.into();
        self.ensure_running()?;

        if let Some(record) = self.inner.current_record(uid) {
            debug!(%uid, "task already tracked");
            return Ok(record);
        }

        let record = self.inner.client.get_task(uid).await?;
        if self.inner.is_destroyed() {
            return Ok(record);
        }

        let mut state = self.inner.state.lock();
        if state.pollers.contains_key(&uid) {
            let current = state.registry.get(uid).map(|entry| entry.record.clone());
            return Ok(current.unwrap_or(record));
        }

        let entry = state.registry.track(record, Instant::now());
        let record = entry.record.clone();
        if entry.is_active() {
            self.inner.spawn_poller(&mut state, uid);
            debug!(%uid, status = %record.status, "polling task");
        } else {
            debug!(%uid, status = %record.status, "task already finished");
        }
        Ok(record)
    }

    /// Awaits a submission, validates its response and tracks the task.
    ///
    /// # Errors
    /// `TaskError::Validation` when the response has no numeric `taskUid`.
    pub async fn submit_task<Fut>(&self, submission: Fut) -> Result<TaskUid>
    where
        Fut: Future<Output = Result<Value>>,
    {
        let response = submission.await?;
        let task = EnqueuedTask::from_response(response)?;
        self.add_task(task.task_uid).await?;
        Ok(task.task_uid)
    }

    /// Registers a callback fired once per task that becomes terminal while
    /// tracked. Panics inside the callback are caught and logged.
    pub fn on_complete<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&TaskRecord) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_subscription.fetch_add(1, Ordering::Relaxed));
        if !self.inner.is_destroyed() {
            self.inner.subscribers.lock().push((id, Arc::new(callback)));
        }
        id
    }

    /// Removes a completion callback. Returns `false` if `id` was unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.inner.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        subscribers.len() != before
    }

    /// Evicts expired and excess completed entries. Returns how many were
    /// removed.
    pub fn cleanup(&self) -> usize {
        self.inner.cleanup()
    }

    /// Re-reads every active task with one paginated bulk query.
    ///
    /// Returns the number of tasks that finished as a result.
    pub async fn refresh(&self) -> Result<usize> {
        self.ensure_running()?;
        self.inner.refresh().await
    }

    /// Stops all polling and background work and drops every subscription.
    ///
    /// Calling it again is a no-op.
    pub fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.shutdown.cancel();

        let pollers = {
            let mut state = self.inner.state.lock();
            state.registry.clear();
            std::mem::take(&mut state.pollers)
        };
        let stopped = pollers.len();
        for poller in pollers.into_values() {
            poller.handle.abort();
        }
        for handle in self.inner.background.lock().drain(..) {
            handle.abort();
        }
        self.inner.subscribers.lock().clear();

        info!(stopped, "task tracker destroyed");
    }

    /// Current bookkeeping for `uid`, if it is tracked.
    pub fn get_task(&self, uid: impl Into<TaskUid>) -> Option<TrackedTask> {
        self.inner.state.lock().registry.get(uid.into()).cloned()
    }

    /// Every tracked task, highest uid first.
    pub fn get_all_tasks(&self) -> Vec<TrackedTask> {
        self.inner.state.lock().registry.snapshot_desc()
    }

    /// Number of tasks that are neither terminal nor abandoned.
    pub fn active_count(&self) -> usize {
        self.inner.state.lock().registry.active_count()
    }

    /// Whether a polling loop is running for `uid`.
    pub fn is_polling(&self, uid: impl Into<TaskUid>) -> bool {
        self.inner.state.lock().pollers.contains_key(&uid.into())
    }

    /// Whether [`TaskTracker::destroy`] has been called.
    pub fn is_destroyed(&self) -> bool {
        self.inner.is_destroyed()
    }

    fn ensure_running(&self) -> Result<()> {
        if self.inner.is_destroyed() {
            return Err(TaskError::Internal("task tracker has been destroyed".into()));
        }
        Ok(())
    }
}

impl Drop for TaskTracker {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl TrackerInner {
    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Record of a task that needs no new fetch: polling or finished.
    fn current_record(&self, uid: TaskUid) -> Option<TaskRecord> {
        let state = self.state.lock();
        let entry = state.registry.get(uid)?;
        (state.pollers.contains_key(&uid) || entry.is_completed()).then(|| entry.record.clone())
    }

    fn spawn_poller(self: &Arc<Self>, state: &mut TrackerState, uid: TaskUid) {
        let token = self.shutdown.child_token();
        let handle = tokio::spawn(Arc::clone(self).poll_loop(uid, token.clone()));
        state.pollers.insert(uid, Poller { token, handle });
    }

    async fn poll_loop(self: Arc<Self>, uid: TaskUid, token: CancellationToken) {
        let period = self.config.poll_interval();
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(%uid, "task polling cancelled");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let result = self.client.get_task(uid).await;
            if token.is_cancelled() {
                // Result arrived after destroy or after a refresh finished it.
                break;
            }

            let keep_polling = match result {
                Ok(record) => match self.apply_record(record) {
                    Transition::StillActive => true,
                    Transition::Completed(_) => false,
                    Transition::Ignored => {
                        self.state.lock().pollers.remove(&uid);
                        false
                    }
                },
                Err(error) => self.record_poll_error(uid, &error),
            };
            if !keep_polling {
                break;
            }
        }
    }

    /// Stores a fetched record; on completion stops the task's poller and
    /// notifies subscribers.
    fn apply_record(&self, record: TaskRecord) -> Transition {
        let uid = record.uid;
        let transition = {
            let mut state = self.state.lock();
            let transition = state.registry.apply(record, Instant::now());
            if matches!(transition, Transition::Completed(_)) {
                if let Some(poller) = state.pollers.remove(&uid) {
                    poller.token.cancel();
                }
            }
            transition
        };

        match &transition {
            Transition::Completed(record) => {
                info!(%uid, status = %record.status, "task finished");
                self.notify(record);
            }
            Transition::StillActive => debug!(%uid, "task still active"),
            Transition::Ignored => {}
        }
        transition
    }

    fn record_poll_error(&self, uid: TaskUid, error: &TaskError) -> bool {
        let failure = {
            let mut state = self.state.lock();
            let failure = state.registry.record_poll_error(uid, self.config.max_poll_errors);
            if !matches!(failure, PollFailure::Retry(_)) {
                state.pollers.remove(&uid);
            }
            failure
        };

        match failure {
            PollFailure::Retry(attempt) => {
                warn!(%uid, attempt, error = %error, "task poll failed");
                true
            }
            PollFailure::Abandoned(attempts) => {
                warn!(%uid, attempts, error = %error, "giving up on task after repeated poll failures");
                false
            }
            PollFailure::Ignored => false,
        }
    }

    fn notify(&self, record: &TaskRecord) {
        let callbacks: Vec<CompletionCallback> =
            self.subscribers.lock().iter().map(|(_, callback)| Arc::clone(callback)).collect();

        for callback in callbacks {
            if panic::catch_unwind(AssertUnwindSafe(|| callback(record))).is_err() {
                error!(uid = %record.uid, "task completion callback panicked");
            }
        }
    }

    fn cleanup(&self) -> usize {
        let removed = self.state.lock().registry.cleanup(
            Instant::now(),
            self.config.completed_retention(),
            self.config.max_completed_entries,
        );
        if !removed.is_empty() {
            debug!(count = removed.len(), "evicted completed tasks");
        }
        removed.len()
    }

    async fn refresh(&self) -> Result<usize> {
        let uids = self.state.lock().registry.active_uids();
        if uids.is_empty() {
            return Ok(0);
        }

        let records = fetch_all_tasks(self.client.as_ref(), &TaskQuery::for_uids(uids)).await?;
        if self.is_destroyed() {
            return Ok(0);
        }

        let finished = records
            .into_iter()
            .map(|record| self.apply_record(record))
            .filter(|transition| matches!(transition, Transition::Completed(_)))
            .count();
        Ok(finished)
    }

    async fn cleanup_loop(self: Arc<Self>, token: CancellationToken) {
        let period = self.config.cleanup_interval();
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    self.cleanup();
                }
            }
        }
        debug!("task cleanup loop stopped");
    }

    async fn refresh_loop(self: Arc<Self>, period: Duration, token: CancellationToken) {
        let max_delay = self.config.max_refresh_backoff().max(period);
        let mut backoff =
            Backoff::new(BackoffStrategy::exponential(period, REFRESH_BACKOFF_FACTOR, max_delay));
        let mut delay = period;

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }

            match self.refresh().await {
                Ok(finished) => {
                    backoff.reset();
                    delay = period;
                    debug!(finished, "refreshed tracked tasks");
                }
                Err(error) => {
                    backoff.next_delay();
                    delay = backoff.peek_delay();
                    warn!(error = %error, retry_in_ms = delay.as_millis() as u64, "task refresh failed");
                }
            }
        }
        debug!("task refresh loop stopped");
    }
}

fn validate(config: &TrackerConfig) -> Result<()> {
    if config.poll_interval_ms == 0 {
        return Err(TaskError::Config("poll_interval_ms must be greater than 0".into()));
    }
    if config.cleanup_interval_ms == 0 {
        return Err(TaskError::Config("cleanup_interval_ms must be greater than 0".into()));
    }
    if config.refresh_interval_ms == Some(0) {
        return Err(TaskError::Config("refresh_interval_ms must be greater than 0".into()));
    }
    Ok(())
}
