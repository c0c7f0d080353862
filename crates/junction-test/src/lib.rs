//! # Junction Test
//!
//! In-memory test utilities for Junction dispatchers: requests go through
//! the full pipeline (verb resolution, binders, hooks, middleware, error
//! responder) without a server or a socket.
//!
//! ## Example
//!
//! ```
//! use http::StatusCode;
//! use junction_core::{response, DispatchContext, Fault};
//! use junction_dispatch::Dispatcher;
//! use junction_test::TestClient;
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher
//!     .bind("id", |raw, _| raw.parse::<u32>().map_err(|_| Fault::not_found()))
//!     .put("items/:id", |ctx: &mut DispatchContext| response::json(&ctx.params().to_json()))
//!     .unwrap();
//!
//! let client = TestClient::new(dispatcher);
//!
//! client
//!     .post("/items/3")
//!     .form_field("_method", "PUT")
//!     .send()
//!     .unwrap()
//!     .assert_status(StatusCode::OK)
//!     .assert_json_eq(&serde_json::json!({ "id": 3 }));
//!
//! client
//!     .get("/items/3")
//!     .send()
//!     .unwrap()
//!     .assert_status(StatusCode::NOT_FOUND)
//!     .assert_body_eq("404 Not Found");
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use response::TestResponse;
