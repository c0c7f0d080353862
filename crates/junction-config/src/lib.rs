//! Typed configuration for the Junction dispatcher.
//!
//! Strict (unknown fields are rejected), layered (defaults, file, env) and
//! validated before use.
//!
//! # Configuration File Format
//!
//! ```toml
//! [routing]
//! base_url = "https://example.com/blog/"
//! entry_stub = "index.php"
//! case_sensitive = false
//! method_override_header = "X-HTTP-Method-Override"
//! method_override_field = "_method"
//! request_timeout_ms = 2000
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! With prefix `JUNCTION`:
//!
//! - `JUNCTION__ROUTING__BASE_URL=/blog`
//! - `JUNCTION__ROUTING__REQUEST_TIMEOUT_MS=none`
//! - `JUNCTION__LOGGING__LEVEL=junction_dispatch=debug`

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;

pub use config::{DispatchConfig, RoutingConfig};
pub use error::ConfigError;
pub use junction_telemetry::{LogConfig, LogFormat};
pub use loader::ConfigLoader;
