//! In-memory test client.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use junction_dispatch::{DispatchRequest, Dispatcher};
use serde::Serialize;

use crate::error::TestError;
use crate::response::TestResponse;

/// Sends requests straight to a [`Dispatcher`], without a server.
///
/// Every request receives a clone of the client's forwarded arguments.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use junction_core::{response, DispatchContext};
/// use junction_dispatch::Dispatcher;
/// use junction_test::TestClient;
///
/// let mut dispatcher = Dispatcher::new();
/// dispatcher
///     .get("hello/:name", |ctx: &mut DispatchContext| {
///         Ok(response::text(format!("hi {}", ctx.params().get_str("name").unwrap_or(""))))
///     })
///     .unwrap();
///
/// let client = TestClient::new(dispatcher);
/// let response = client.get("/hello/ada").send().unwrap();
/// response.assert_status(StatusCode::OK).assert_body_eq("hi ada");
/// ```
pub struct TestClient<S = ()> {
    dispatcher: Arc<Dispatcher<S>>,
    args: S,
    default_headers: HeaderMap,
}

impl<S: Default + Clone + 'static> TestClient<S> {
    /// Creates a client that forwards `S::default()` with each request.
    pub fn new(dispatcher: Dispatcher<S>) -> Self {
        Self::with_args(dispatcher, S::default())
    }
}

impl<S: Clone + 'static> TestClient<S> {
    /// Creates a client that forwards a clone of `args` with each request.
    pub fn with_args(dispatcher: Dispatcher<S>, args: S) -> Self {
        Self::shared(Arc::new(dispatcher), args)
    }

    /// Creates a client over a dispatcher shared with other code.
    pub fn shared(dispatcher: Arc<Dispatcher<S>>, args: S) -> Self {
        Self {
            dispatcher,
            args,
            default_headers: HeaderMap::new(),
        }
    }

    /// Adds a header sent with every request. Invalid headers are ignored.
    pub fn with_default_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            self.default_headers.insert(name, value);
        }
        self
    }

    /// Returns the dispatcher under test.
    pub fn dispatcher(&self) -> &Dispatcher<S> {
        &self.dispatcher
    }

    /// Starts a `GET` request.
    pub fn get(&self, path: impl AsRef<str>) -> TestClientRequest<'_, S> {
        self.request(Method::GET, path)
    }

    /// Starts a `POST` request.
    pub fn post(&self, path: impl AsRef<str>) -> TestClientRequest<'_, S> {
        self.request(Method::POST, path)
    }

    /// Starts a `PUT` request.
    pub fn put(&self, path: impl AsRef<str>) -> TestClientRequest<'_, S> {
        self.request(Method::PUT, path)
    }

    /// Starts a `PATCH` request.
    pub fn patch(&self, path: impl AsRef<str>) -> TestClientRequest<'_, S> {
        self.request(Method::PATCH, path)
    }

    /// Starts a `DELETE` request.
    pub fn delete(&self, path: impl AsRef<str>) -> TestClientRequest<'_, S> {
        self.request(Method::DELETE, path)
    }

    /// Starts a `HEAD` request.
    pub fn head(&self, path: impl AsRef<str>) -> TestClientRequest<'_, S> {
        self.request(Method::HEAD, path)
    }

    /// Starts a request with any verb.
    pub fn request(&self, method: Method, path: impl AsRef<str>) -> TestClientRequest<'_, S> {
        self.raw(method.as_str(), path)
    }

    /// Starts a request with a raw verb, including unsupported ones.
    pub fn raw(&self, method: &str, path: impl AsRef<str>) -> TestClientRequest<'_, S> {
        TestClientRequest {
            client: self,
            request: DispatchRequest::new(method, path.as_ref())
                .headers(self.default_headers.clone()),
            args: None,
        }
    }
}

/// A request being built by a [`TestClient`].
#[must_use]
pub struct TestClientRequest<'a, S> {
    client: &'a TestClient<S>,
    request: DispatchRequest,
    args: Option<S>,
}

impl<S: Clone + 'static> TestClientRequest<'_, S> {
    /// Adds a header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.request = self.request.header(name, value);
        self
    }

    /// Adds a decoded form field.
    pub fn form_field(mut self, name: &str, value: &str) -> Self {
        self.request = self.request.form_field(name, value);
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.request = self.request.body(body);
        self
    }

    /// Serializes `value` as the JSON body.
    pub fn json<T: Serialize>(mut self, value: &T) -> Result<Self, TestError> {
        let body = serde_json::to_vec(value)?;
        self.request = self
            .request
            .body(body)
            .header(CONTENT_TYPE.as_str(), "application/json");
        Ok(self)
    }

    /// Sets a deadline relative to the start of dispatch.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request = self.request.timeout(timeout);
        self
    }

    /// Forwards `args` instead of the client's arguments.
    pub fn args(mut self, args: S) -> Self {
        self.args = Some(args);
        self
    }

    /// Dispatches the request.
    pub fn send(self) -> Result<TestResponse, TestError> {
        let args = self.args.unwrap_or_else(|| self.client.args.clone());
        let response = self.client.dispatcher.dispatch(self.request, args)?;
        Ok(TestResponse::from(response))
    }
}
