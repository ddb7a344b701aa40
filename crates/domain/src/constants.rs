//! Library constants
//!
//! Centralized defaults for chunking, polling and retention.

// Chunk planning
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const MIN_CHUNK_SIZE: usize = 1;
pub const MAX_CHUNK_SIZE: usize = 10_000;
pub const DEFAULT_MEMORY_BUDGET_MB: f64 = 10.0;
pub const MAX_MEMORY_BUDGET_MB: f64 = 100.0;
pub const SIZE_SAMPLE_LIMIT: usize = 10;
pub const SERIALIZATION_OVERHEAD: f64 = 1.3;
pub const MIN_ITEM_SIZE_BYTES: f64 = 100.0;
pub const UNSERIALIZABLE_ITEM_SIZE_BYTES: f64 = 1024.0;

// Tracker polling
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const MAX_CONSECUTIVE_POLL_ERRORS: u32 = 5;
pub const COMPLETED_RETENTION_MS: u64 = 5 * 60 * 1000;
pub const MAX_COMPLETED_ENTRIES: usize = 50;
pub const CLEANUP_INTERVAL_MS: u64 = 60 * 1000;
pub const MAX_REFRESH_BACKOFF_MS: u64 = 30 * 1000;
pub const REFRESH_BACKOFF_FACTOR: f64 = 2.0;

// Waiting
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_WAIT_INTERVAL_MS: u64 = 50;
pub const MAX_WAIT_INTERVAL_MS: u64 = 1000;
pub const WAIT_BACKOFF_FACTOR: f64 = 1.5;

// HTTP transport
pub const DEFAULT_HOST: &str = "http://127.0.0.1:7700";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 200;

/// Page size used when walking `/tasks` pages.
pub const TASK_PAGE_LIMIT: u32 = 100;
