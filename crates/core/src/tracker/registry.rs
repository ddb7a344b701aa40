//! Bookkeeping for tracked tasks, independent of any timers.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use meilisync_domain::{TaskRecord, TaskUid};
use tokio::time::Instant;

/// A task as seen by the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedTask {
    pub record: TaskRecord,
    /// Monotonic instant the terminal status was first observed.
    pub completed_at: Option<Instant>,
    pub completed_at_wall: Option<DateTime<Utc>>,
    /// Reset to zero by every successful poll.
    pub consecutive_poll_errors: u32,
    /// Polling gave up after too many errors; `record` is stale.
    pub abandoned: bool,
}

impl TrackedTask {
    fn new(record: TaskRecord, now: Instant) -> Self {
        let mut entry = Self {
            record,
            completed_at: None,
            completed_at_wall: None,
            consecutive_poll_errors: 0,
            abandoned: false,
        };
        if entry.record.is_terminal() {
            entry.mark_completed(now);
        }
        entry
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Still expected to change: non-terminal and not abandoned.
    pub fn is_active(&self) -> bool {
        !self.is_completed() && !self.abandoned
    }

    fn mark_completed(&mut self, now: Instant) {
        if self.completed_at.is_none() {
            self.completed_at = Some(now);
            self.completed_at_wall = Some(Utc::now());
        }
    }
}

/// Result of applying a fetched record.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Transition {
    /// Unknown, abandoned or already terminal; nothing stored.
    Ignored,
    StillActive,
    /// Terminal status reached by this update.
    Completed(TaskRecord),
}

/// Result of recording a failed poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PollFailure {
    Ignored,
    Retry(u32),
    Abandoned(u32),
}

#[derive(Debug, Default)]
pub(crate) struct TaskRegistry {
    entries: HashMap<TaskUid, TrackedTask>,
}

impl TaskRegistry {
    pub(crate) fn get(&self, uid: TaskUid) -> Option<&TrackedTask> {
        self.entries.get(&uid)
    }

    /// Stores a freshly fetched record, replacing an abandoned entry.
    pub(crate) fn track(&mut self, record: TaskRecord, now: Instant) -> &TrackedTask {
        let uid = record.uid;
        let entry = self.entries.entry(uid).or_insert_with(|| TrackedTask::new(record.clone(), now));
        if entry.abandoned {
            *entry = TrackedTask::new(record, now);
        }
        entry
    }

    pub(crate) fn apply(&mut self, record: TaskRecord, now: Instant) -> Transition {
        let Some(entry) = self.entries.get_mut(&record.uid) else {
            return Transition::Ignored;
        };
        if entry.is_completed() || entry.abandoned {
            return Transition::Ignored;
        }

        entry.consecutive_poll_errors = 0;
        let previous = entry.record.status;
        entry.record = record;

        if entry.record.is_terminal() && previous != entry.record.status {
            entry.mark_completed(now);
            Transition::Completed(entry.record.clone())
        } else {
            Transition::StillActive
        }
    }

    pub(crate) fn record_poll_error(&mut self, uid: TaskUid, max_errors: u32) -> PollFailure {
        let Some(entry) = self.entries.get_mut(&uid) else {
            return PollFailure::Ignored;
        };
        if entry.is_completed() {
            return PollFailure::Ignored;
        }

        entry.consecutive_poll_errors = entry.consecutive_poll_errors.saturating_add(1);
        if entry.consecutive_poll_errors > max_errors {
            entry.abandoned = true;
            PollFailure::Abandoned(entry.consecutive_poll_errors)
        } else {
            PollFailure::Retry(entry.consecutive_poll_errors)
        }
    }

    /// Drops completed entries older than `retention`, then the oldest
    /// completed entries until at most `max_completed` remain.
    pub(crate) fn cleanup(
        &mut self,
        now: Instant,
        retention: Duration,
        max_completed: usize,
    ) -> Vec<TaskUid> {
        let mut removed = Vec::new();
        self.entries.retain(|uid, entry| match entry.completed_at {
            Some(completed_at) if now.saturating_duration_since(completed_at) > retention => {
                removed.push(*uid);
                false
            }
            _ => true,
        });

        let mut completed: Vec<(Instant, TaskUid)> = self
            .entries
            .iter()
            .filter_map(|(uid, entry)| entry.completed_at.map(|at| (at, *uid)))
            .collect();
        if completed.len() > max_completed {
            completed.sort_unstable();
            let excess = completed.len() - max_completed;
            for (_, uid) in completed.into_iter().take(excess) {
                self.entries.remove(&uid);
                removed.push(uid);
            }
        }
        removed
    }

    /// All entries, highest uid first.
    pub(crate) fn snapshot_desc(&self) -> Vec<TrackedTask> {
        let mut entries: Vec<TrackedTask> = self.entries.values().cloned().collect();
        entries.sort_unstable_by(|a, b| b.record.uid.cmp(&a.record.uid));
        entries
    }

    pub(crate) fn active_uids(&self) -> Vec<TaskUid> {
        self.entries.iter().filter(|(_, e)| e.is_active()).map(|(uid, _)| *uid).collect()
    }

    pub(crate) fn active_count(&self) -> usize {
        self.entries.values().filter(|e| e.is_active()).count()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
