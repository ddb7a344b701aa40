//! Domain data types

pub mod batch;
pub mod query;
pub mod task;

pub use batch::{BatchOutcome, ChunkError, SubmittedChunk};
pub use query::{TaskPage, TaskQuery, TaskStats};
pub use task::{EnqueuedTask, TaskErrorPayload, TaskRecord, TaskStatus, TaskUid};
