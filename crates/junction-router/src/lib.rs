//! # Junction Router
//!
//! Pattern compilation, verb resolution, path normalization and ordered
//! route lookup for the Junction dispatcher.
//!
//! Templates are compiled once into anchored regular expressions and scanned
//! in registration order. The table is generic over the value stored with
//! each route, so this crate knows nothing about handlers or middleware.
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use junction_router::{PathNormalizer, RouteTable};
//!
//! let mut table = RouteTable::new();
//! table.insert(Method::GET.into(), "/books/:isbn", "book").unwrap();
//!
//! let path = PathNormalizer::new().normalize("/books/978-3/?ref=home");
//! let matched = table.lookup(&Method::GET, &path).unwrap();
//!
//! assert_eq!(matched.template(), "books/:isbn");
//! assert_eq!(matched.params().get("isbn"), Some("978-3"));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod method;
mod params;
mod path;
mod pattern;
mod table;

pub use error::{RouteError, RouteResult};
pub use method::{
    parse_method, split_route, MethodResolver, VerbSelector, DEFAULT_OVERRIDE_FIELD,
    DEFAULT_OVERRIDE_HEADER, SUPPORTED_METHODS,
};
pub use params::Params;
pub use path::PathNormalizer;
pub use pattern::{CompiledPattern, PatternCompiler};
pub use table::{Route, RouteMatch, RouteTable};
