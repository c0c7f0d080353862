//! The terminal handler signature.

use std::sync::Arc;

use crate::context::DispatchContext;
use crate::error::HandlerResult;

/// The last link of a route's chain: turns a context into a response.
///
/// Implemented for every `Fn(&mut DispatchContext<S>) -> HandlerResult`.
pub trait Handler<S>: Send + Sync + 'static {
    /// Handles the request.
    fn call(&self, ctx: &mut DispatchContext<S>) -> HandlerResult;
}

impl<S, F> Handler<S> for F
where
    F: Fn(&mut DispatchContext<S>) -> HandlerResult + Send + Sync + 'static,
{
    fn call(&self, ctx: &mut DispatchContext<S>) -> HandlerResult {
        self(ctx)
    }
}

/// A shared, type-erased handler.
pub type BoxedHandler<S> = Arc<dyn Handler<S>>;

/// Erases a closure into a [`BoxedHandler`].
pub fn handler<S, F>(f: F) -> BoxedHandler<S>
where
    F: Fn(&mut DispatchContext<S>) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(f)
}
