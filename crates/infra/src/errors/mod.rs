//! Conversions from infrastructure errors into `TaskError`.

pub mod conversions;

pub use conversions::{map_reqwest_error, InfraError};
