//! # Junction
//!
//! A minimal request router. Given a verb and a path it selects a
//! registered handler chain, binds the named path parameters, runs hooks
//! and middleware, and falls back to per-status error handlers when
//! nothing matches.
//!
//! ## Crates
//!
//! | Crate | Purpose |
//! |-------|---------|
//! | [`router`] | Template compilation, verb resolution, path normalization, route table |
//! | [`core`] | Request context, responses, the `Fault` error model |
//! | [`middleware`] | `Middleware`, continuations, chain links, gates |
//! | [`dispatch`] | The `Dispatcher` and its registries |
//! | [`config`] | Typed, layered configuration |
//! | [`telemetry`] | Logging setup and dispatch metrics |
//!
//! ## Example
//!
//! ```
//! use junction::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new()
//!     .with_string("[routing]\nbase_url = \"/blog\"", "toml")?
//!     .load()?;
//!
//! let mut dispatcher = Dispatcher::from_config(&config)?;
//! dispatcher
//!     .bind("year", |raw, _| raw.parse::<u16>().map_err(|_| Fault::not_found()))
//!     .get("archive/:year@\\d{4}", |ctx: &mut DispatchContext| {
//!         Ok(response::text(format!("posts from {}", ctx.params().get_i64("year").unwrap_or(0))))
//!     })?;
//!
//! let response = dispatcher.dispatch(DispatchRequest::new("GET", "/blog/archive/2019"), ())?;
//! assert_eq!(response.body().as_ref(), b"posts from 2019");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use junction_core as core;

// Re-export router types
pub use junction_router as router;

// Re-export middleware types
pub use junction_middleware as middleware;

// Re-export dispatcher types
pub use junction_dispatch as dispatch;

// Re-export configuration types
pub use junction_config as config;

// Re-export telemetry setup
pub use junction_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```
/// use junction::prelude::*;
/// ```
pub mod prelude {
    pub use junction_core::{
        handler, response, BoundParams, DispatchContext, DispatchError, Fault, Handler,
        HandlerResult, RequestId, Response,
    };

    pub use junction_router::{MethodResolver, PathNormalizer, PatternCompiler, VerbSelector};

    pub use junction_middleware::{from_fn, BoxedMiddleware, Gate, Link, Middleware, Next};

    pub use junction_dispatch::{
        DispatchRequest, Dispatcher, ErrorContext, Resource, ResourceAction,
    };

    pub use junction_config::{ConfigLoader, DispatchConfig};

    pub use junction_telemetry::{init_logging, LogConfig, LogFormat};
}
