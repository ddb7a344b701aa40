//! Task tracking
//!
//! [`TaskTracker`] owns a registry of tracked tasks and one polling loop per
//! unfinished task; [`TrackedTask`] is the per-task bookkeeping it exposes.

pub mod registry;
pub mod service;

pub use registry::TrackedTask;
pub use service::{SubscriptionId, TaskTracker};
