//! Request dispatch for Junction.
//!
//! A [`Dispatcher`] owns every registry a request needs: the route table,
//! binders and filters, before and after hooks, path-scoped middleware and
//! the error responder. It is built once at startup and then only read,
//! one [`dispatch`](Dispatcher::dispatch) call per request.
//!
//! # Example
//!
//! ```
//! use http::StatusCode;
//! use junction_core::{response, DispatchContext};
//! use junction_dispatch::{DispatchRequest, Dispatcher};
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher
//!     .get("users/:id", |ctx: &mut DispatchContext| {
//!         Ok(response::text(format!("user {}", ctx.params().get_str("id").unwrap_or(""))))
//!     })
//!     .unwrap()
//!     .any("ping", |_: &mut DispatchContext| Ok(response::text("pong")))
//!     .unwrap();
//! dispatcher.on_error(StatusCode::NOT_FOUND, |ctx| {
//!     Some(response::text(format!("nothing at /{}", ctx.path())))
//! });
//!
//! let ok = dispatcher.dispatch(DispatchRequest::new("DELETE", "/ping"), ()).unwrap();
//! assert_eq!(ok.body().as_ref(), b"pong");
//!
//! let missing = dispatcher.dispatch(DispatchRequest::new("GET", "/nope"), ()).unwrap();
//! assert_eq!(missing.status(), StatusCode::NOT_FOUND);
//! assert_eq!(missing.body().as_ref(), b"nothing at /nope");
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binder;
mod dispatcher;
mod hooks;
mod request;
mod resource;
mod responder;

pub use binder::{Binder, Filter, ParamBinder};
pub use dispatcher::Dispatcher;
pub use hooks::{AfterHook, BeforeHook, HookList};
pub use request::DispatchRequest;
pub use resource::{Resource, ResourceAction};
pub use responder::{ErrorContext, ErrorHandler, ErrorResponder};
