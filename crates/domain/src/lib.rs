//! # meilisync Domain
//!
//! Data types shared by every meilisync crate.
//!
//! This crate contains:
//! - Task records, handles and status enum
//! - Batch outcome types
//! - The error taxonomy and `Result` alias
//! - Configuration structures and defaults
//!
//! ## Architecture
//! - No dependencies on other meilisync crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
