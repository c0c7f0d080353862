//! Test error types.

use junction_core::DispatchError;
use thiserror::Error;

/// Errors that can occur while exercising a dispatcher.
#[derive(Debug, Error)]
pub enum TestError {
    /// The dispatcher returned an error instead of a response.
    #[error("dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    /// The response body is not valid UTF-8.
    #[error("body read error: {0}")]
    BodyRead(String),

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
