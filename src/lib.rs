//! # Junction
//!
//! **Junction** is a small coroutine-powered HTTP router for JSON services,
//! built on the `may` runtime and `may_minihttp`.
//!
//! ## Overview
//!
//! Handlers are registered against a method and a path template such as
//! `/users/:id`. Each request is matched against the table in registration
//! order (first match wins), its JSON body is parsed, and the handler answers
//! through a [`Responder`] that wraps every payload in a uniform envelope:
//!
//! ```json
//! { "code": 200, "message": "OK", "data": { "id": "42" } }
//! ```
//!
//! ## Architecture
//!
//! - **[`router`]** - Template compilation, route table and request matching
//! - **[`dispatcher`]** - Request lifecycle, handler invocation and error capture
//! - **[`server`]** - HTTP transport on `may_minihttp`
//! - **[`runtime_config`]** - Environment-driven runtime settings
//! - **[`logging`]** - `tracing` subscriber initialisation
//! - **[`ids`]** - ULID request ids for log correlation
//! - **[`error`]** - Route registration errors
//!
//! ## Quick Start
//!
//! ```rust
//! use junction::{Dispatcher, HandlerError, Router};
//! use http::Method;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut router = Router::new();
//! router
//!     .get("/items/:id", |ctx, res| {
//!         let id = ctx.param("id").unwrap_or_default();
//!         res.json(serde_json::json!({ "id": id }))
//!     })?
//!     .delete("/items/:id", |_, _| {
//!         Err(HandlerError::new("ForbiddenError", "items are read-only"))
//!     })?;
//!
//! let dispatcher = Dispatcher::new(router);
//! let reply = dispatcher.dispatch(Method::GET, "/items/42", b"");
//! assert_eq!(reply.status(), 200);
//!
//! let reply = dispatcher.dispatch(Method::GET, "/nope", b"");
//! assert_eq!(reply.status(), 404);
//! # Ok(())
//! # }
//! ```
//!
//! Serving over HTTP:
//!
//! ```rust,no_run
//! # use junction::{Dispatcher, Router};
//! # let router = Router::new();
//! let handle = junction::listen(Dispatcher::new(router), 8080, |addr| {
//!     println!("listening on {addr}");
//! })?;
//! handle.join().ok();
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! ## Runtime Configuration
//!
//! | Variable | Default |
//! |---|---|
//! | `JUNCTION_STACK_SIZE` | `0x4000` |
//! | `JUNCTION_BODY_TIMEOUT_MS` | `30000` |
//! | `JUNCTION_MAX_BODY_BYTES` | `1048576` |
//! | `JUNCTION_MATCH_MODE` | `per-route` |
//! | `JUNCTION_LOG_LEVEL` | `info` |
//! | `JUNCTION_LOG_FORMAT` | `json` |
//!
//! The body deadline is checked whenever a chunk or the end of the body
//! arrives. A client that stops sending mid-body holds its connection
//! coroutine until it sends more or disconnects.

pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod logging;
pub mod router;
pub mod runtime_config;
pub mod server;

pub use dispatcher::{Dispatcher, HandlerError, Reply, RequestContext, Responder};
pub use error::RouteError;
pub use router::{MatchMode, Router};
pub use server::listen;
