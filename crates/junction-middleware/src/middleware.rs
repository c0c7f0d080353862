//! Core middleware trait and the continuation type.
//!
//! A middleware receives the request context and a [`Next`] continuation.
//! Calling [`Next::run`] runs the rest of the chain; returning without
//! calling it short-circuits, and the middleware's own result becomes the
//! response.
//!
//! # Example
//!
//! ```
//! use junction_core::{response, DispatchContext, HandlerResult};
//! use junction_middleware::{Middleware, Next};
//!
//! struct Banner;
//!
//! impl Middleware<()> for Banner {
//!     fn name(&self) -> &'static str {
//!         "banner"
//!     }
//!
//!     fn process(&self, ctx: &mut DispatchContext, next: Next<'_>) -> HandlerResult {
//!         if ctx.path() == "maintenance" {
//!             return Ok(response::text("back soon"));
//!         }
//!         next.run(ctx)
//!     }
//! }
//! ```

use junction_core::{DispatchContext, Handler, HandlerResult};

/// A wrapper around the rest of a handler chain.
///
/// # Invariants
///
/// - A middleware calls `next.run()` at most once; `Next` is consumed.
/// - A middleware that does not call `next.run()` produces the response
///   itself, and nothing downstream runs.
pub trait Middleware<S = ()>: Send + Sync + 'static {
    /// Returns the name used in logs.
    fn name(&self) -> &'static str;

    /// Processes the request, optionally delegating to `next`.
    fn process(&self, ctx: &mut DispatchContext<S>, next: Next<'_, S>) -> HandlerResult;
}

/// The continuation handed to a middleware.
pub struct Next<'a, S = ()> {
    inner: NextInner<'a, S>,
}

enum NextInner<'a, S> {
    Chain {
        middleware: &'a dyn Middleware<S>,
        next: Box<Next<'a, S>>,
    },
    Handler(&'a dyn Handler<S>),
}

impl<'a, S: 'static> Next<'a, S> {
    /// Creates a continuation that runs `middleware`, then `next`.
    pub fn new(middleware: &'a dyn Middleware<S>, next: Next<'a, S>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal continuation that runs `handler`.
    pub fn handler(handler: &'a dyn Handler<S>) -> Self {
        Self {
            inner: NextInner::Handler(handler),
        }
    }

    /// Runs the next link.
    pub fn run(self, ctx: &mut DispatchContext<S>) -> HandlerResult {
        match self.inner {
            NextInner::Chain { middleware, next } => {
                tracing::trace!(middleware = middleware.name(), "entering middleware");
                middleware.process(ctx, *next)
            }
            NextInner::Handler(handler) => handler.call(ctx),
        }
    }
}

/// A middleware built from a closure.
///
/// # Example
///
/// ```
/// use junction_core::{DispatchContext, Fault};
/// use junction_middleware::{from_fn, Next};
///
/// let require_token = from_fn("require-token", |ctx: &mut DispatchContext, next: Next<'_>| {
///     match ctx.header_str("authorization") {
///         Some(_) => next.run(ctx),
///         None => Err(Fault::abort(http::StatusCode::UNAUTHORIZED)),
///     }
/// });
/// # let _ = require_token;
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Creates a closure-backed middleware.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<S: 'static, F> Middleware<S> for FnMiddleware<F>
where
    F: Fn(&mut DispatchContext<S>, Next<'_, S>) -> HandlerResult + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process(&self, ctx: &mut DispatchContext<S>, next: Next<'_, S>) -> HandlerResult {
        (self.func)(ctx, next)
    }
}

/// Creates a [`FnMiddleware`], pinning the closure's signature.
pub fn from_fn<S, F>(name: &'static str, func: F) -> FnMiddleware<F>
where
    F: Fn(&mut DispatchContext<S>, Next<'_, S>) -> HandlerResult + Send + Sync + 'static,
{
    FnMiddleware::new(name, func)
}
