//! Batch processing operations
//!
//! This module splits document sets into chunks and submits them one chunk at
//! a time, recording per-chunk failures instead of aborting the run.

pub mod executor;
pub mod options;
pub mod planner;
pub mod stream;

pub use executor::BatchExecutor;
pub use options::{BatchOptions, ChunkCompleteCallback, ChunkErrorCallback};
pub use planner::{estimate_chunk_size, plan_chunks, ChunkPlan};
pub use stream::StreamBatchExecutor;
