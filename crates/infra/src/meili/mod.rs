//! MeiliSearch HTTP adapter
//!
//! [`MeiliClient`] implements the core `TaskStatusClient` and
//! `DocumentWriter` ports on top of [`HttpClient`](crate::http::HttpClient).

pub mod client;

pub use client::{HealthStatus, MeiliClient};
