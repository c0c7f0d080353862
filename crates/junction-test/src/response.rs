//! Test response wrapper.

use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use junction_core::Response;
use serde::de::DeserializeOwned;

use crate::error::TestError;

/// A dispatched response with assertion helpers.
#[derive(Debug, Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl From<Response> for TestResponse {
    fn from(response: Response) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }
}

impl TestResponse {
    /// Returns the status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the status as a number.
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(name.as_ref())
    }

    /// Returns a header value as text.
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.header(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the `Content-Type`.
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// Returns the raw body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as UTF-8 text.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("invalid UTF-8: {e}")))
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    // Assertion methods

    /// Panics unless the status equals `expected`.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "expected status {}, got {}",
            expected, self.status
        );
        self
    }

    /// Panics unless the status is 2xx.
    pub fn assert_success(&self) -> &Self {
        assert!(
            self.status.is_success(),
            "expected success status, got {}",
            self.status
        );
        self
    }

    /// Panics unless header `name` equals `expected`.
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let actual = self.header_str(name);
        assert_eq!(
            actual,
            Some(expected.as_ref()),
            "expected header {name} to be {:?}, got {actual:?}",
            expected.as_ref()
        );
        self
    }

    /// Panics unless the body equals `expected`.
    pub fn assert_body_eq(&self, expected: impl AsRef<str>) -> &Self {
        let actual = String::from_utf8_lossy(&self.body);
        assert_eq!(actual, expected.as_ref(), "body mismatch");
        self
    }

    /// Panics unless the body contains `expected`.
    pub fn assert_body_contains(&self, expected: impl AsRef<str>) -> &Self {
        let actual = String::from_utf8_lossy(&self.body);
        assert!(
            actual.contains(expected.as_ref()),
            "expected body to contain {:?}, got {actual:?}",
            expected.as_ref()
        );
        self
    }

    /// Panics unless the body is empty.
    pub fn assert_body_empty(&self) -> &Self {
        assert!(self.body.is_empty(), "expected empty body, got {} bytes", self.body.len());
        self
    }

    /// Panics unless the JSON body equals `expected`.
    pub fn assert_json_eq(&self, expected: &serde_json::Value) -> &Self {
        match self.json::<serde_json::Value>() {
            Ok(actual) => assert_eq!(&actual, expected, "JSON body mismatch"),
            Err(e) => panic!("body is not JSON: {e}"),
        }
        self
    }
}
