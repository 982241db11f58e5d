//! # Dispatcher Module
//!
//! Request lifecycle and handler dispatch.
//!
//! ## Overview
//!
//! The dispatcher owns the (now immutable) route table and, for every
//! request:
//! - accumulates body bytes until the transport signals end of stream
//! - parses the body as JSON (empty body = `{}`)
//! - matches the route table, falling back to the not-found handler
//! - invokes the handler with a [`RequestContext`] and a [`Responder`]
//! - turns handler errors and panics into a 500 envelope
//!
//! ## Handler Registration
//!
//! Handlers are registered on the [`Router`](crate::router::Router) before
//! the dispatcher takes ownership of it:
//!
//! ```rust
//! use junction::dispatcher::{Dispatcher, HandlerError};
//! use junction::router::Router;
//! use http::Method;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut router = Router::new();
//! router.post("/users", |ctx, res| res.status(201).json(&ctx.body))?;
//! router.get("/fail", |_, _| Err(HandlerError::new("ValidationError", "bad input")))?;
//!
//! let dispatcher = Dispatcher::new(router);
//! let reply = dispatcher.dispatch(Method::POST, "/users", br#"{"name":"Ada"}"#);
//! assert_eq!(
//!     reply.body_json()?,
//!     json!({ "code": 201, "message": "Created", "data": { "name": "Ada" } })
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! | Failure | Response |
//! |---|---|
//! | no matching route | 404, `data: {reason: "Cannot <METHOD> to <path>"}` |
//! | body is not JSON | 500, `data: {name: "BodyParseError", message}` |
//! | handler returns `Err` | 500, `data: {name, message}` |
//! | handler panics | 500, `data: {name: "Panic", message}` |
//! | handler never responds | 500, `data: {name: "NoResponseError", message}` |
//! | chunk or end arrived after the deadline | 408, `data: {reason}` |
//! | body over the size limit | 413, `data: {reason}` |
//!
//! A handler that finalises twice gets `Err(DoubleResponseError)` from the
//! second call; the first response is what is sent.

mod core;
mod lifecycle;
mod request;
mod response;

pub use core::{default_not_found, Dispatcher, Handler, HandlerError, HandlerOutcome};
pub use lifecycle::{Exchange, ExchangeError, ExchangeState};
pub use request::{parse_body, parse_query_params, RequestContext};
pub use response::{
    status_reason, Reply, Responder, ResponseEnvelope, JSON_CONTENT_TYPE, UNKNOWN_REASON,
};
