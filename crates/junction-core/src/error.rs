//! Handler and dispatch error types.
//!
//! Handlers, middleware, hooks and binders return [`Fault`]. A
//! [`Fault::Abort`] is the only recoverable path: the dispatcher turns it
//! into a response through the error responder. A [`Fault::Fatal`] is
//! never swallowed and reaches the host as [`DispatchError::Handler`].

use std::time::Duration;

use http::StatusCode;
use thiserror::Error;

use crate::response::Response;

/// Result type returned by handlers and middleware.
pub type HandlerResult = Result<Response, Fault>;

/// A failure raised while handling a request.
#[derive(Debug, Error)]
pub enum Fault {
    /// Stop dispatch and respond with `status` through the error responder.
    #[error("request aborted with status {status}")]
    Abort {
        /// Status to respond with.
        status: StatusCode,
        /// Optional message passed to the error handlers.
        message: Option<String>,
    },

    /// Any other failure. Reported to the host, never turned into a response.
    #[error(transparent)]
    Fatal(#[from] anyhow::Error),
}

impl Fault {
    /// Aborts with `status` and no message.
    pub fn abort(status: StatusCode) -> Self {
        Self::Abort {
            status,
            message: None,
        }
    }

    /// Aborts with `status` and a message for the error handlers.
    pub fn abort_with(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Abort {
            status,
            message: Some(message.into()),
        }
    }

    /// Aborts with 404.
    pub fn not_found() -> Self {
        Self::abort(StatusCode::NOT_FOUND)
    }

    /// Aborts with 400 and a message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::abort_with(StatusCode::BAD_REQUEST, message)
    }

    /// Wraps any error as a fatal fault.
    pub fn fatal<E>(error: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self::Fatal(error.into())
    }

    /// Returns the abort status, or `None` for fatal faults.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Abort { status, .. } => Some(*status),
            Self::Fatal(_) => None,
        }
    }

    /// Returns true if this fault is a recoverable abort.
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Abort { .. })
    }
}

/// Errors reported by the dispatcher to the host.
///
/// Route misses and unsupported verbs are not errors: they become 404 and
/// 400 responses.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A handler, middleware, hook or binder failed with a fatal fault.
    #[error("handler failed: {0}")]
    Handler(#[source] anyhow::Error),

    /// The request's cancellation token fired.
    #[error("dispatch cancelled")]
    Cancelled,

    /// The request's deadline passed between stages.
    #[error("dispatch deadline exceeded after {elapsed:?}")]
    DeadlineExceeded {
        /// Time spent in dispatch when the deadline was detected.
        elapsed: Duration,
    },
}

impl DispatchError {
    /// Suggested status for a host that still wants to reply.
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Handler(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            Self::DeadlineExceeded { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_carries_status() {
        let fault = Fault::abort(StatusCode::FORBIDDEN);
        assert!(fault.is_abort());
        assert_eq!(fault.status(), Some(StatusCode::FORBIDDEN));
    }

    #[test]
    fn test_abort_with_message() {
        let fault = Fault::bad_request("missing id");
        match fault {
            Fault::Abort { status, message } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(message.as_deref(), Some("missing id"));
            }
            Fault::Fatal(_) => panic!("expected abort"),
        }
    }

    #[test]
    fn test_fatal_from_std_error() {
        let io = std::io::Error::other("disk gone");
        let fault = Fault::fatal(io);
        assert!(!fault.is_abort());
        assert_eq!(fault.status(), None);
        assert_eq!(fault.to_string(), "disk gone");
    }

    #[test]
    fn test_fatal_from_anyhow_with_question_mark() {
        fn fails() -> Result<(), Fault> {
            let failed: anyhow::Result<()> = Err(anyhow::anyhow!("boom"));
            failed?;
            Ok(())
        }
        assert!(matches!(fails(), Err(Fault::Fatal(_))));
    }

    #[test]
    fn test_dispatch_error_status() {
        assert_eq!(
            DispatchError::Handler(anyhow::anyhow!("x")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            DispatchError::Cancelled.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            DispatchError::DeadlineExceeded {
                elapsed: Duration::from_millis(5)
            }
            .status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }
}
