//! # meilisync Core
//!
//! Pure business logic layer - no HTTP or I/O.
//!
//! This crate contains:
//! - Port interfaces (traits) for task status lookups and document writes
//! - Chunk planning and sequential batch executors
//! - The task tracker and the task waiter
//!
//! ## Architecture Principles
//! - Depends on `meilisync-common` and `meilisync-domain` only
//! - All remote access goes through [`ports::TaskStatusClient`] and
//!   [`documents::DocumentWriter`]
//! - Background work runs on tokio tasks owned by the component that spawned
//!   them and is cancelled through `CancellationToken`s

pub mod batch;
pub mod documents;
pub mod ports;
pub mod stats;
pub mod tracker;
pub mod wait;

// Re-export specific items to avoid ambiguity
pub use batch::{
    estimate_chunk_size, plan_chunks, BatchExecutor, BatchOptions, ChunkPlan, StreamBatchExecutor,
};
pub use documents::{DocumentBatchService, DocumentWriter};
pub use ports::TaskStatusClient;
pub use stats::{collect_task_stats, fetch_all_tasks};
pub use tracker::{SubscriptionId, TaskTracker, TrackedTask};
pub use wait::{TaskWaiter, WaitOptions};
