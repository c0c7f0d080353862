//! Per-status error responses.
//!
//! Triggered when no route matches (404), when the verb is unsupported
//! (400) and whenever a hook, binder, middleware or handler aborts. A
//! trigger always ends the request.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use junction_core::{response, RequestId, Response};

/// A handler registered for a status code.
///
/// Returning `None` leaves the response to the other handlers or the
/// default body.
pub type ErrorHandler = Arc<dyn Fn(&ErrorContext) -> Option<Response> + Send + Sync>;

/// What an error handler knows about the failed request.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    status: StatusCode,
    message: Option<String>,
    method: String,
    path: String,
    request_id: RequestId,
}

impl ErrorContext {
    /// Creates a context for `status`.
    pub fn new(
        status: StatusCode,
        message: Option<String>,
        method: impl Into<String>,
        path: impl Into<String>,
        request_id: RequestId,
    ) -> Self {
        Self {
            status,
            message,
            method: method.into(),
            path: path.into(),
            request_id,
        }
    }

    /// The status being responded with.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The message attached to the abort, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The verb, as resolved or as received when resolution failed.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The normalized path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The request id.
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// The abort message, else the canonical reason phrase.
    pub fn reason(&self) -> &str {
        self.message
            .as_deref()
            .or_else(|| self.status.canonical_reason())
            .unwrap_or("Page Error")
    }
}

/// Registry of error handlers keyed by status code.
#[derive(Default, Clone)]
pub struct ErrorResponder {
    handlers: HashMap<StatusCode, Vec<ErrorHandler>>,
}

impl ErrorResponder {
    /// Creates an empty responder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handler for `status`. Handlers for one code run in
    /// registration order.
    pub fn register<F>(&mut self, status: StatusCode, handler: F)
    where
        F: Fn(&ErrorContext) -> Option<Response> + Send + Sync + 'static,
    {
        self.handlers.entry(status).or_default().push(Arc::new(handler));
    }

    /// Returns true if any handler is registered for `status`.
    pub fn handles(&self, status: StatusCode) -> bool {
        self.handlers.get(&status).is_some_and(|h| !h.is_empty())
    }

    /// Produces the response for `ctx`.
    ///
    /// Every handler for the code runs; the last one that returns a
    /// response wins. Without one, the body is `"{code} {reason}"`. The
    /// status is always the triggered code.
    pub fn respond(&self, ctx: &ErrorContext) -> Response {
        let mut produced = None;
        for handler in self.handlers.get(&ctx.status).into_iter().flatten() {
            if let Some(response) = handler(ctx) {
                produced = Some(response);
            }
        }

        let mut response = produced.unwrap_or_else(|| default_response(ctx));
        *response.status_mut() = ctx.status;
        response
    }
}

impl fmt::Debug for ErrorResponder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut codes: Vec<u16> = self.handlers.keys().map(StatusCode::as_u16).collect();
        codes.sort_unstable();
        f.debug_struct("ErrorResponder").field("codes", &codes).finish()
    }
}

fn default_response(ctx: &ErrorContext) -> Response {
    response::text_with_status(
        ctx.status,
        format!("{} {}", ctx.status.as_u16(), ctx.reason()),
    )
}
