//! Route compilation and request-line matching for Hermes.
//!
//! This crate turns the HTTP triggers declared in a manifest into regular
//! expressions over request lines (`"GET api/users/42?x=1"`) and resolves a
//! request line to the first declared route that accepts it.
//!
//! # Features
//!
//! - **Path Templates**: `{name}` captures one segment, `{name+}` captures the rest
//! - **Case Rules**: methods match case-insensitively, paths case-sensitively
//! - **Query Strings**: always accepted, decoded into an ordered map
//! - **Declaration Order**: the first matching route wins
//!
//! # Example
//!
//! ```rust
//! use hermes_router::{parse_query, RouteTable, RouteTemplate};
//!
//! let table = RouteTable::compile([
//!     RouteTemplate::new("hello", "GET", "api/hello/{name}", "handler.hello"),
//!     RouteTemplate::new("files", "GET", "api/files/{path+}", "handler.files"),
//! ])
//! .unwrap();
//!
//! let m = table.match_request("get api/files/a/b/c.txt?download=1").unwrap();
//! assert_eq!(m.route.template.handler_ref.as_str(), "handler.files");
//! assert_eq!(m.path_params.get("path"), Some("a/b/c.txt"));
//!
//! let query = parse_query("get api/files/a/b/c.txt?download=1").unwrap();
//! assert_eq!(query.get("download"), Some("1"));
//! ```
//!
//! # Limitations
//!
//! A greedy placeholder followed by more literal segments
//! (`{rest+}/suffix`) compiles, but backtracking decides how the text is
//! split. Placeholders embedded in a larger segment (`v{version}`) are
//! literal text.
//!
//! A greedy placeholder captures `[^?]+` rather than `.+`, so it never
//! takes the query string. The price is that a greedy route does not match
//! a request whose greedy part is empty before the query:
//! `greedy/{rest+}` rejects `GET greedy/?x=1`, which an `(.+)` capture would
//! have accepted with `rest = "?x=1"`.

mod compiler;
mod error;
mod matcher;
mod params;
mod request;
mod template;

pub use compiler::{compile_path, CompiledRoute};
pub use error::{RouterError, RouterResult};
pub use matcher::{extract_params, find_route, match_route, RouteMatch, RouteTable};
pub use params::Params;
pub use request::{parse_query, RequestLine};
pub use template::{HandlerRef, RouteTemplate, ANY_METHOD};
