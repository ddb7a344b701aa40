//! # meilisync Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The retrying HTTP client (reqwest)
//! - The MeiliSearch adapter implementing `TaskStatusClient` and
//!   `DocumentWriter`
//! - Configuration loading from environment variables and files
//! - Tracing subscriber installation
//!
//! ## Architecture
//! - Implements traits defined in `meilisync-core`
//! - Contains all "impure" code (network I/O, filesystem, process env)

pub mod config;
pub mod errors;
pub mod http;
pub mod meili;
pub mod observability;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use meili::{HealthStatus, MeiliClient};
pub use observability::init_tracing;
