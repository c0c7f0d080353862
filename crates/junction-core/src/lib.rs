//! # Junction Core
//!
//! Request, response and error types shared by every Junction crate.
//!
//! - [`DispatchContext`] carries request-scoped state through a dispatch.
//! - [`Fault`] is what handlers fail with; [`DispatchError`] is what the
//!   host sees.
//! - [`response`] builds the [`Response`] values handlers return.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bound;
mod context;
mod error;
mod handler;
pub mod response;

pub use bound::BoundParams;
pub use context::{DispatchContext, RequestId};
pub use error::{DispatchError, Fault, HandlerResult};
pub use handler::{handler, BoxedHandler, Handler};
pub use response::Response;
