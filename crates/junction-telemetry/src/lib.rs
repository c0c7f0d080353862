//! Logging and metrics for Junction.
//!
//! - [`logging`]: installs a `tracing-subscriber` registry with an
//!   `EnvFilter` and a JSON or pretty formatter.
//! - [`metrics`]: metric names and recording helpers for dispatch
//!   outcomes, written through the `metrics` facade.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};

/// Result type alias using [`TelemetryError`].
pub type TelemetryResult<T> = Result<T, TelemetryError>;
