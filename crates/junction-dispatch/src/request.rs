//! The inbound side of a dispatch call.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue};
use junction_core::RequestId;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A request as the dispatcher sees it.
///
/// The verb is kept as raw text so that unsupported verbs reach the
/// dispatcher and are answered with 400 rather than rejected by the host.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use junction_dispatch::DispatchRequest;
///
/// let request = DispatchRequest::new("POST", "/posts/7?draft=1")
///     .form_field("_method", "PUT")
///     .timeout(Duration::from_millis(250));
///
/// assert_eq!(request.method(), "POST");
/// assert_eq!(request.field("_method"), Some("PUT"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DispatchRequest {
    method: String,
    path: String,
    headers: HeaderMap,
    fields: HashMap<String, String>,
    body: Bytes,
    request_id: Option<RequestId>,
    deadline: Option<Instant>,
    timeout: Option<Duration>,
    cancel: Option<CancellationToken>,
}

impl DispatchRequest {
    /// Creates a request for `method` and a raw path, which may carry a
    /// query string.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Adds a header. Invalid names or values are logged and skipped; use
    /// [`try_header`](Self::try_header) to reject them instead.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match parse_header(name, value) {
            Ok((name, value)) => {
                self.headers.append(name, value);
            }
            Err(e) => debug!(header = %name, error = %e, "invalid header skipped"),
        }
        self
    }

    /// Adds a header, failing on an invalid name or value.
    pub fn try_header(mut self, name: &str, value: &str) -> Result<Self, http::Error> {
        let (name, value) = parse_header(name, value)?;
        self.headers.append(name, value);
        Ok(self)
    }

    /// Replaces all headers.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Adds a decoded body field.
    pub fn form_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Propagates a request id from the host.
    pub fn request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Sets an absolute deadline. Takes precedence over [`timeout`](Self::timeout).
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets a deadline relative to the start of dispatch.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attaches a cancellation token.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Returns the raw verb.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the raw path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns a body field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub(crate) fn into_parts(self) -> RequestParts {
        RequestParts {
            method: self.method,
            path: self.path,
            headers: self.headers,
            fields: self.fields,
            body: self.body,
            request_id: self.request_id,
            deadline: self.deadline,
            timeout: self.timeout,
            cancel: self.cancel,
        }
    }
}

impl From<http::Request<Bytes>> for DispatchRequest {
    /// Converts a host request. URL-encoded form bodies are decoded into
    /// fields so that verb overrides work without extra plumbing.
    fn from(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();

        let path = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_string(), |pq| pq.as_str().to_string());

        let is_form = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with(FORM_CONTENT_TYPE));

        let fields = if is_form {
            url::form_urlencoded::parse(&body)
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        } else {
            HashMap::new()
        };

        Self {
            method: parts.method.as_str().to_string(),
            path,
            headers: parts.headers,
            fields,
            body,
            ..Self::default()
        }
    }
}

/// Owned pieces of a request, consumed by the dispatcher.
pub(crate) struct RequestParts {
    pub method: String,
    pub path: String,
    pub headers: HeaderMap,
    pub fields: HashMap<String, String>,
    pub body: Bytes,
    pub request_id: Option<RequestId>,
    pub deadline: Option<Instant>,
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), http::Error> {
    Ok((HeaderName::try_from(name)?, HeaderValue::try_from(value)?))
}
