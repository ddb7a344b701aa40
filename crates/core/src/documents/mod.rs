//! Batched document writes
//!
//! This module provides the [`DocumentWriter`] port and a service that feeds
//! it through the batch executors.

pub mod ports;
pub mod service;

pub use ports::DocumentWriter;
pub use service::DocumentBatchService;
