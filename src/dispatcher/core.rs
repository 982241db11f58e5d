//! Dispatcher core module - hot path for request dispatch.
//!
//! Runs the Routing and Handling phases of a request: parse the body, match
//! the route table, invoke the matched (or not-found) handler and convert
//! any failure into a 500 envelope at this boundary.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]

use http::Method;
use serde::Serialize;
use serde_json::json;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::lifecycle::Exchange;
use super::request::{parse_body, RequestContext};
use super::response::{Reply, Responder, ResponseEnvelope};
use crate::ids::RequestId;
use crate::router::{ParamVec, Router};
use crate::runtime_config::RuntimeConfig;

/// A route or not-found handler.
pub type Handler =
    Arc<dyn Fn(&RequestContext, &mut Responder) -> Result<(), HandlerError> + Send + Sync>;

/// A failure raised by handler code, or by the framework on its behalf.
///
/// Rendered as `data: {name, message}` in a 500 envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{name}: {message}")]
pub struct HandlerError {
    /// Error kind, e.g. `ValidationError`.
    pub name: String,
    pub message: String,
}

impl HandlerError {
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Use the error's type name (without its module path) as the kind.
    #[must_use]
    pub fn from_error<E: std::error::Error>(err: &E) -> Self {
        let full = std::any::type_name::<E>();
        let base = full.split('<').next().unwrap_or(full);
        let name = base.rsplit("::").next().unwrap_or(base);
        Self::new(name, err.to_string())
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::new("JsonError", err.to_string())
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(err: std::io::Error) -> Self {
        Self::new("IoError", err.to_string())
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        Self::new("Error", format!("{err:#}"))
    }
}

/// Result of running one handler at the dispatch boundary.
#[derive(Debug)]
pub enum HandlerOutcome {
    /// The handler finalised a response.
    Success(Reply),
    /// The handler failed before finalising anything.
    Failure(HandlerError),
}

impl HandlerOutcome {
    /// Collapse into the reply that goes on the wire.
    #[must_use]
    pub fn into_reply(self) -> Reply {
        match self {
            HandlerOutcome::Success(reply) => reply,
            HandlerOutcome::Failure(err) => {
                Reply::from_envelope(ResponseEnvelope::failure(500, &err))
            }
        }
    }
}

/// Not-found handler installed by default.
///
/// # Errors
///
/// Only if finalising the response fails.
pub fn default_not_found(ctx: &RequestContext, res: &mut Responder) -> Result<(), HandlerError> {
    res.status(404).json(json!({
        "reason": format!("Cannot {} to {}", ctx.method, ctx.raw_path)
    }))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

/// Run `handler` and turn everything it can do into a [`HandlerOutcome`].
///
/// Once a response has been finalised it is what goes on the wire, whatever
/// the handler does afterwards.
pub(crate) fn invoke(handler: &Handler, ctx: &RequestContext) -> HandlerOutcome {
    let mut responder = Responder::new();
    let result = catch_unwind(AssertUnwindSafe(|| handler(ctx, &mut responder)));
    let sent = responder.take_reply();

    match (result, sent) {
        (Ok(Ok(())), Some(reply)) => HandlerOutcome::Success(reply),
        (Ok(Ok(())), None) => {
            warn!(
                request_id = %ctx.request_id,
                method = %ctx.method,
                path = %ctx.raw_path,
                "Handler returned without sending a response"
            );
            HandlerOutcome::Failure(HandlerError::new(
                "NoResponseError",
                "handler completed without sending a response",
            ))
        }
        (Ok(Err(err)), Some(reply)) => {
            warn!(
                request_id = %ctx.request_id,
                error = %err,
                status = reply.status(),
                "Handler failed after its response was sent - keeping sent response"
            );
            HandlerOutcome::Success(reply)
        }
        (Ok(Err(err)), None) => {
            error!(
                request_id = %ctx.request_id,
                method = %ctx.method,
                path = %ctx.raw_path,
                error_name = %err.name,
                error_message = %err.message,
                "Handler failed"
            );
            HandlerOutcome::Failure(err)
        }
        (Err(panic), sent) => {
            let message = panic_message(panic.as_ref());
            error!(
                request_id = %ctx.request_id,
                method = %ctx.method,
                path = %ctx.raw_path,
                panic_message = %message,
                response_sent = sent.is_some(),
                "Handler panicked - CRITICAL"
            );
            match sent {
                Some(reply) => HandlerOutcome::Success(reply),
                None => HandlerOutcome::Failure(HandlerError::new("Panic", message)),
            }
        }
    }
}

/// Owns the route table and runs requests against it.
///
/// Cloning is cheap; the router is shared read-only.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    router: Arc<Router>,
    config: RuntimeConfig,
}

impl Dispatcher {
    /// Freeze `router` and build a dispatcher with default configuration.
    #[must_use]
    pub fn new(router: Router) -> Self {
        Self::with_config(router, RuntimeConfig::default())
    }

    #[must_use]
    pub fn with_config(router: Router, config: RuntimeConfig) -> Self {
        let summary = router.route_summaries();
        info!(
            routes_count = router.len(),
            static_segments = router.static_segments().len(),
            mode = ?router.mode(),
            routes_summary = ?summary.iter().take(10).collect::<Vec<_>>(),
            "Routing table loaded"
        );
        Self {
            router: Arc::new(router),
            config,
        }
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Start a request in the Receiving state.
    #[must_use]
    pub fn begin(&self, method: Method, raw_path: impl Into<String>) -> Exchange {
        self.begin_with_request_id(RequestId::new(), method, raw_path)
    }

    #[must_use]
    pub fn begin_with_request_id(
        &self,
        request_id: RequestId,
        method: Method,
        raw_path: impl Into<String>,
    ) -> Exchange {
        Exchange::new(self.clone(), request_id, method, raw_path.into())
    }

    /// One-shot dispatch of a request whose body is already complete.
    #[must_use]
    pub fn dispatch(&self, method: Method, raw_path: &str, body: &[u8]) -> Reply {
        let mut exchange = self.begin(method, raw_path);
        if exchange.on_data(body).is_err() {
            debug!(request_id = %exchange.request_id(), "Receiving ended early");
        }
        exchange.finish()
    }

    /// Routing and Handling for a fully received body.
    pub(crate) fn route_and_handle(
        &self,
        request_id: RequestId,
        method: Method,
        raw_path: String,
        body: &[u8],
    ) -> Reply {
        let start = Instant::now();

        let parsed = parse_body(body);
        let matched = self.router.match_route(&method, &raw_path);
        let (handler, params, route_pattern) = match matched {
            Some(m) => (
                Arc::clone(&m.route.handler),
                m.params,
                m.route.pattern.template(),
            ),
            None => (
                Arc::clone(self.router.not_found_handler()),
                ParamVec::new(),
                String::from("<not found>"),
            ),
        };

        let outcome = match parsed {
            Ok(body) => {
                let ctx = RequestContext::new(request_id, method, raw_path, body, params);
                // D1: Handler invocation
                debug!(
                    request_id = %ctx.request_id,
                    route_pattern = %route_pattern,
                    path_params = ?ctx.params,
                    "Invoking handler"
                );
                invoke(&handler, &ctx)
            }
            Err(err) => {
                warn!(
                    request_id = %request_id,
                    method = %method,
                    path = %raw_path,
                    error = %err.message,
                    "Request body is not valid JSON"
                );
                HandlerOutcome::Failure(err)
            }
        };

        let reply = outcome.into_reply();
        // D2: Handler complete
        info!(
            request_id = %request_id,
            route_pattern = %route_pattern,
            status = reply.status(),
            latency_us = start.elapsed().as_micros(),
            "Request handled"
        );
        reply
    }
}
