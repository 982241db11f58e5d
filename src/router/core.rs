//! Router core module - hot path for request routing.
//!
//! Holds the route table built at startup and resolves an incoming
//! method + path to the first compatible route in registration order.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]

use http::Method;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::pattern::{compile, split_segments, CompiledPattern, Segment};
use crate::dispatcher::{default_not_found, Handler, HandlerError, RequestContext, Responder};
use crate::error::RouteError;

/// Maximum number of path/query parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Names are `Arc<str>` shared with the compiled route; values are
/// per-request data copied out of the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Matches slower than this are logged at `warn`.
const SLOW_MATCH: Duration = Duration::from_millis(1);

/// How the router decides whether a position is literal or a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Each route is matched against its own compiled shape only.
    #[default]
    PerRoute,
    /// Literal-vs-parameter is decided by membership of the incoming segment
    /// in the router-wide [`StaticSegmentSet`]. Routes registered with
    /// different literals at the same position interfere with each other.
    GlobalLiterals,
}

impl MatchMode {
    /// Parse `per-route` / `global-literals`. Unknown values give `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per-route" | "per_route" | "perroute" => Some(MatchMode::PerRoute),
            "global-literals" | "global_literals" | "global" => Some(MatchMode::GlobalLiterals),
            _ => None,
        }
    }
}

/// Every literal segment text seen across all registered routes.
///
/// Only grows.
#[derive(Debug, Clone, Default)]
pub struct StaticSegmentSet {
    literals: HashSet<Arc<str>>,
}

impl StaticSegmentSet {
    pub fn extend<'a>(&mut self, literals: impl IntoIterator<Item = &'a Arc<str>>) {
        for lit in literals {
            if !self.literals.contains(lit.as_ref()) {
                self.literals.insert(Arc::clone(lit));
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, segment: &str) -> bool {
        self.literals.contains(segment)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }
}

/// A registered route. Immutable once registered.
pub struct Route {
    pub method: Method,
    pub pattern: CompiledPattern,
    pub handler: Handler,
}

impl Route {
    #[inline]
    #[must_use]
    pub fn pattern_id(&self) -> &str {
        &self.pattern.pattern_id
    }

    #[inline]
    #[must_use]
    pub fn param_names(&self) -> &[Arc<str>] {
        &self.pattern.param_names
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("template", &self.pattern.template())
            .field("pattern_id", &self.pattern.pattern_id)
            .finish_non_exhaustive()
    }
}

/// Result of successfully matching a request path to a route.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    /// Path parameters in path order.
    pub params: ParamVec,
}

impl RouteMatch {
    /// Get a path parameter by name (last write wins).
    #[inline]
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Note: this allocates - use `get_param()` in hot paths instead
    #[must_use]
    pub fn params_map(&self) -> HashMap<String, String> {
        self.params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// Remove the query string (everything from the first `?`).
#[inline]
#[must_use]
pub fn strip_query(raw_path: &str) -> &str {
    raw_path.split_once('?').map_or(raw_path, |(path, _)| path)
}

fn is_word_token(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Route table and matcher.
///
/// Built mutably at startup, then handed to a
/// [`Dispatcher`](crate::dispatcher::Dispatcher) which shares it read-only
/// between all in-flight requests.
#[derive(Clone)]
pub struct Router {
    routes: Vec<Arc<Route>>,
    static_segments: StaticSegmentSet,
    mode: MatchMode,
    not_found: Handler,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("mode", &self.mode)
            .field("routes", &self.routes)
            .field("static_segments", &self.static_segments.len())
            .finish_non_exhaustive()
    }
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::with_mode(MatchMode::default())
    }

    #[must_use]
    pub fn with_mode(mode: MatchMode) -> Self {
        Self {
            routes: Vec::new(),
            static_segments: StaticSegmentSet::default(),
            mode,
            not_found: Arc::new(default_not_found),
        }
    }

    #[must_use]
    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered routes in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.iter()
    }

    #[must_use]
    pub fn static_segments(&self) -> &StaticSegmentSet {
        &self.static_segments
    }

    #[must_use]
    pub fn not_found_handler(&self) -> &Handler {
        &self.not_found
    }

    /// `METHOD /template` lines for startup logging.
    #[must_use]
    pub fn route_summaries(&self) -> Vec<String> {
        self.routes
            .iter()
            .map(|r| format!("{} {}", r.method, r.pattern.template()))
            .collect()
    }

    /// Register `handler` for `method` + `template`.
    ///
    /// A template with the same shape as an existing route for the same
    /// method replaces that route's handler in place, keeping its position in
    /// the table. Overlapping shapes are allowed; the earlier registration
    /// wins at match time.
    ///
    /// # Errors
    ///
    /// See [`compile`](super::pattern::compile).
    pub fn route<F>(
        &mut self,
        method: Method,
        template: &str,
        handler: F,
    ) -> Result<&mut Self, RouteError>
    where
        F: Fn(&RequestContext, &mut Responder) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let pattern = compile(&method, template)?;
        self.static_segments.extend(&pattern.literals);

        let route = Arc::new(Route {
            method,
            pattern,
            handler: Arc::new(handler),
        });

        if let Some(slot) = self
            .routes
            .iter_mut()
            .find(|r| r.method == route.method && r.pattern.same_shape(&route.pattern))
        {
            warn!(
                method = %route.method,
                previous = %slot.pattern.template(),
                template = %route.pattern.template(),
                "Replaced existing route - later registration shadows earlier one"
            );
            *slot = route;
            return Ok(self);
        }

        if let Some(earlier) = self
            .routes
            .iter()
            .find(|r| r.method == route.method && r.pattern.overlaps(&route.pattern))
        {
            warn!(
                method = %route.method,
                earlier = %earlier.pattern.template(),
                template = %route.pattern.template(),
                "Route overlaps an earlier registration - first match wins"
            );
        }

        debug!(
            method = %route.method,
            template = %route.pattern.template(),
            pattern_id = %route.pattern.pattern_id,
            param_names = ?route.pattern.param_names,
            total_routes = self.routes.len() + 1,
            "Route registered"
        );
        self.routes.push(route);
        Ok(self)
    }

    pub fn get<F>(&mut self, template: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&RequestContext, &mut Responder) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.route(Method::GET, template, handler)
    }

    pub fn post<F>(&mut self, template: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&RequestContext, &mut Responder) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.route(Method::POST, template, handler)
    }

    pub fn put<F>(&mut self, template: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&RequestContext, &mut Responder) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.route(Method::PUT, template, handler)
    }

    pub fn delete<F>(&mut self, template: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&RequestContext, &mut Responder) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.route(Method::DELETE, template, handler)
    }

    /// Replace the handler invoked when nothing matches.
    pub fn set_not_found<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&RequestContext, &mut Responder) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.not_found = Arc::new(handler);
        self
    }

    /// Resolve `method` + `raw_path` to the first compatible route.
    ///
    /// The query string is ignored. Returns `None` when nothing matches.
    #[must_use]
    pub fn match_route(&self, method: &Method, raw_path: &str) -> Option<RouteMatch> {
        // RT1: Route match attempt
        debug!(method = %method, path = %raw_path, mode = ?self.mode, "Route match attempt");

        let match_start = Instant::now();
        let segments: SmallVec<[&str; 16]> = split_segments(strip_query(raw_path)).collect();

        let result = self.routes.iter().find_map(|route| {
            let params = match self.mode {
                MatchMode::PerRoute => Self::match_own_shape(route, method, &segments),
                MatchMode::GlobalLiterals => self.match_global_literals(route, method, &segments),
            }?;
            Some(RouteMatch {
                route: Arc::clone(route),
                params,
            })
        });

        let match_duration = match_start.elapsed();
        match &result {
            Some(m) => {
                // RT2: Route matched
                if match_duration > SLOW_MATCH {
                    warn!(
                        method = %method,
                        path = %raw_path,
                        route_pattern = %m.route.pattern.template(),
                        path_params = ?m.params,
                        duration_us = match_duration.as_micros(),
                        "Slow route matching detected"
                    );
                } else {
                    info!(
                        method = %method,
                        path = %raw_path,
                        route_pattern = %m.route.pattern.template(),
                        path_params = ?m.params,
                        duration_us = match_duration.as_micros(),
                        "Route matched"
                    );
                }
            }
            None => {
                // RT3: No route found (404)
                warn!(
                    method = %method,
                    path = %raw_path,
                    duration_us = match_duration.as_micros(),
                    "No route matched"
                );
            }
        }
        result
    }

    fn match_own_shape(route: &Route, method: &Method, segments: &[&str]) -> Option<ParamVec> {
        if route.method != *method || route.pattern.len() != segments.len() {
            return None;
        }
        let mut params = ParamVec::new();
        for (seg, incoming) in route.pattern.segments.iter().zip(segments) {
            match seg {
                Segment::Literal(text) => {
                    if text.as_ref() != *incoming {
                        return None;
                    }
                }
                Segment::Param(name) => params.push((Arc::clone(name), (*incoming).to_string())),
            }
        }
        Some(params)
    }

    fn match_global_literals(
        &self,
        route: &Route,
        method: &Method,
        segments: &[&str],
    ) -> Option<ParamVec> {
        if route.method != *method || route.pattern.len() != segments.len() {
            return None;
        }
        // An incoming segment known as a literal anywhere must appear verbatim
        // in this route; any other segment only needs this route's template
        // text at that position to be a word token.
        let compatible = route
            .pattern
            .segments
            .iter()
            .zip(segments)
            .all(|(seg, incoming)| {
                if self.static_segments.contains(incoming) {
                    seg.text() == *incoming
                } else {
                    is_word_token(seg.text())
                }
            });
        if !compatible {
            return None;
        }

        // Bind every position whose value differs from the template text,
        // keyed by that text.
        let mut params = ParamVec::new();
        for (seg, incoming) in route.pattern.segments.iter().zip(segments) {
            if seg.text() != *incoming {
                let key = match seg {
                    Segment::Literal(t) | Segment::Param(t) => Arc::clone(t),
                };
                params.push((key, (*incoming).to_string()));
            }
        }
        Some(params)
    }
}
