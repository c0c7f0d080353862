//! Response type and constructors.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE, LOCATION};
use http::StatusCode;
use serde::Serialize;

use crate::error::{Fault, HandlerResult};

/// The response produced by a dispatch.
pub type Response = http::Response<Bytes>;

const TEXT: &str = "text/plain; charset=utf-8";
const HTML: &str = "text/html; charset=utf-8";
const JSON: &str = "application/json";

fn with_body(status: StatusCode, content_type: &'static str, body: Bytes) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// A `200 OK` plain text response.
pub fn text(body: impl Into<String>) -> Response {
    with_body(StatusCode::OK, TEXT, Bytes::from(body.into()))
}

/// A plain text response with an explicit status.
pub fn text_with_status(status: StatusCode, body: impl Into<String>) -> Response {
    with_body(status, TEXT, Bytes::from(body.into()))
}

/// A `200 OK` HTML response.
pub fn html(body: impl Into<String>) -> Response {
    with_body(StatusCode::OK, HTML, Bytes::from(body.into()))
}

/// A `200 OK` JSON response.
///
/// Serialization failures are fatal.
pub fn json<T: Serialize + ?Sized>(value: &T) -> HandlerResult {
    let body = serde_json::to_vec(value).map_err(Fault::fatal)?;
    Ok(with_body(StatusCode::OK, JSON, Bytes::from(body)))
}

/// An empty-bodied redirect to `location`.
///
/// `status` must be a 3xx code; use [`StatusCode::FOUND`] for the usual
/// temporary redirect.
pub fn redirect(location: &str, status: StatusCode) -> HandlerResult {
    if !status.is_redirection() {
        return Err(Fault::fatal(anyhow::anyhow!(
            "redirect status must be 3xx, got {status}"
        )));
    }
    let location = HeaderValue::from_str(location).map_err(Fault::fatal)?;

    let mut response = empty(status);
    response.headers_mut().insert(LOCATION, location);
    Ok(response)
}

/// A response with no body.
pub fn empty(status: StatusCode) -> Response {
    let mut response = Response::new(Bytes::new());
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_response() {
        let response = text("hello");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], TEXT);
        assert_eq!(response.body(), &Bytes::from_static(b"hello"));
    }

    #[test]
    fn test_text_with_status() {
        let response = text_with_status(StatusCode::CREATED, "made");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_html_response() {
        let response = html("<p>hi</p>");
        assert_eq!(response.headers()[CONTENT_TYPE], HTML);
    }

    #[test]
    fn test_json_response() {
        let response = json(&serde_json::json!({ "id": 7 })).unwrap();
        assert_eq!(response.headers()[CONTENT_TYPE], JSON);
        assert_eq!(response.body(), &Bytes::from_static(br#"{"id":7}"#));
    }

    #[test]
    fn test_redirect() {
        let response = redirect("/login", StatusCode::FOUND).unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/login");
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_redirect_rejects_non_3xx() {
        assert!(redirect("/login", StatusCode::OK).is_err());
        assert!(redirect("/bad\nheader", StatusCode::FOUND).is_err());
    }

    #[test]
    fn test_empty() {
        let response = empty(StatusCode::NO_CONTENT);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.body().is_empty());
        assert!(response.headers().is_empty());
    }
}
