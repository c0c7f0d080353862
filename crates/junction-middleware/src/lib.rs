//! # Junction Middleware
//!
//! Continuation-passing middleware for Junction routes.
//!
//! A route's handler list is validated into a [`Chain`]: middleware links
//! followed by one terminal handler. On dispatch, middleware collected from
//! `apply` registrations ([`ApplyRegistry`]) are placed outside the route's
//! own middleware and the whole list is folded right-to-left into nested
//! [`Next`] continuations.
//!
//! ```text
//! applied[0] -> applied[1] -> route mw[0] -> route mw[1] -> handler
//! ```
//!
//! Any link may return without calling its continuation, in which case
//! nothing further inward runs.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod apply;
mod chain;
mod gate;
mod middleware;

pub use apply::ApplyRegistry;
pub use chain::{BoxedMiddleware, Chain, Link};
pub use gate::Gate;
pub use middleware::{from_fn, FnMiddleware, Middleware, Next};
