//! Guard middleware that short-circuits when a predicate fails.

use http::StatusCode;
use junction_core::{DispatchContext, Fault, HandlerResult};

use crate::middleware::{Middleware, Next};

/// Lets a request through only when `predicate` holds.
///
/// On failure the chain stops and the request is aborted with the gate's
/// status, which the error responder turns into a response.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use junction_core::DispatchContext;
/// use junction_middleware::Gate;
///
/// let admins_only = Gate::new("admins-only", |ctx: &DispatchContext| {
///     ctx.header_str("x-role") == Some("admin")
/// })
/// .with_status(StatusCode::UNAUTHORIZED);
/// # let _ = admins_only;
/// ```
pub struct Gate<P> {
    name: &'static str,
    predicate: P,
    status: StatusCode,
}

impl<P> Gate<P> {
    /// Creates a gate that aborts with 403 when `predicate` is false.
    pub fn new<S>(name: &'static str, predicate: P) -> Self
    where
        P: Fn(&DispatchContext<S>) -> bool + Send + Sync + 'static,
    {
        Self {
            name,
            predicate,
            status: StatusCode::FORBIDDEN,
        }
    }

    /// Sets the status used when the gate refuses a request.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl<S: 'static, P> Middleware<S> for Gate<P>
where
    P: Fn(&DispatchContext<S>) -> bool + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process(&self, ctx: &mut DispatchContext<S>, next: Next<'_, S>) -> HandlerResult {
        if (self.predicate)(ctx) {
            next.run(ctx)
        } else {
            tracing::debug!(gate = self.name, status = self.status.as_u16(), "request refused");
            Err(Fault::abort(self.status))
        }
    }
}
