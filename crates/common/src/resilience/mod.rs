//! Resilience patterns for polling and retrying remote calls
//!
//! - [`BackoffStrategy`]: how a delay grows with the attempt number
//! - [`Backoff`]: a stateful cursor over a strategy, reset on success
//!
//! With the `runtime` feature, [`Backoff::wait`] sleeps on the tokio clock so
//! paused-time tests drive it deterministically.

pub mod backoff;

pub use backoff::{Backoff, BackoffStrategy};
