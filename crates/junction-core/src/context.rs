//! Per-request dispatch state.
//!
//! A [`DispatchContext`] is created at the start of a dispatch call, passed
//! by mutable reference through hooks, middleware and the terminal handler,
//! and dropped when the call returns. Nothing in it outlives the request.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::{Extensions, HeaderMap, Method};
use junction_router::Params;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::bound::BoundParams;

/// A unique identifier for each dispatch, using UUID v7.
///
/// UUID v7 is time-ordered, so ids sort by arrival in logs.
///
/// # Example
///
/// ```
/// use junction_core::RequestId;
///
/// let id = RequestId::new();
/// assert_eq!(id.to_string().len(), 36);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new time-ordered request id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Request-scoped state seen by binders, filters, hooks, middleware and
/// handlers.
///
/// `S` is the type of the arguments forwarded by the caller of `dispatch`.
///
/// # Example
///
/// ```
/// use http::Method;
/// use junction_core::DispatchContext;
///
/// let ctx = DispatchContext::new(Method::GET, "users/7", "tenant-a");
/// assert_eq!(ctx.path(), "users/7");
/// assert_eq!(*ctx.args(), "tenant-a");
/// assert!(ctx.route().is_none());
/// ```
#[derive(Debug)]
pub struct DispatchContext<S = ()> {
    request_id: RequestId,
    method: Method,
    path: String,
    headers: HeaderMap,
    fields: HashMap<String, String>,
    body: Bytes,
    route: Option<String>,
    raw_params: Params,
    params: BoundParams,
    args: S,
    extensions: Extensions,
    deadline: Option<Instant>,
    cancel: CancellationToken,
    started_at: Instant,
}

impl<S> DispatchContext<S> {
    /// Creates a context for a resolved verb and normalized path.
    pub fn new(method: Method, path: impl Into<String>, args: S) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            fields: HashMap::new(),
            body: Bytes::new(),
            route: None,
            raw_params: Params::new(),
            params: BoundParams::new(),
            args,
            extensions: Extensions::new(),
            deadline: None,
            cancel: CancellationToken::new(),
            started_at: Instant::now(),
        }
    }

    /// Sets the request headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the decoded form fields.
    pub fn with_fields(mut self, fields: HashMap<String, String>) -> Self {
        self.fields = fields;
        self
    }

    /// Sets the request body.
    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    /// Sets an absolute deadline.
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Sets the cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Uses a request id supplied by the host instead of a fresh one.
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Returns the request id.
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the resolved verb, after any POST override.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the normalized path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, if present and valid.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the form fields.
    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }

    /// Returns a single form field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Returns the request body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the matched template, once a route has matched.
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// Returns the raw captured values.
    pub fn raw_params(&self) -> &Params {
        &self.raw_params
    }

    /// Returns the bound values.
    pub fn params(&self) -> &BoundParams {
        &self.params
    }

    /// Returns the bound value for one symbol.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Returns the forwarded arguments.
    pub fn args(&self) -> &S {
        &self.args
    }

    /// Returns the forwarded arguments mutably.
    pub fn args_mut(&mut self) -> &mut S {
        &mut self.args
    }

    /// Consumes the context and returns the forwarded arguments.
    pub fn into_args(self) -> S {
        self.args
    }

    /// Returns the request-scoped extensions.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Returns the request-scoped extensions mutably.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Returns the deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the time left before the deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Returns true if the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Returns the cancellation token.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Returns true if the request was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns the time since the context was created.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Records the matched route and its captured values.
    ///
    /// This should only be called by the dispatcher after lookup. Each
    /// captured value is also stored as a bound string until a binder
    /// replaces it.
    pub fn set_match(&mut self, template: impl Into<String>, raw: Params) {
        for (name, value) in &raw {
            self.params.insert(name, Value::String(value.to_string()));
        }
        self.route = Some(template.into());
        self.raw_params = raw;
    }

    /// Returns the bound values mutably.
    ///
    /// This should only be called by the dispatcher while binding.
    pub fn params_mut(&mut self) -> &mut BoundParams {
        &mut self.params
    }
}
