use http::Method;
use thiserror::Error;

/// Errors raised while registering a route.
///
/// These only ever happen at startup, before the listener accepts
/// connections, so callers usually propagate them straight out of `main`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// Only GET, POST, PUT and DELETE can be registered.
    #[error("unsupported method {method} for route {template}")]
    UnsupportedMethod { method: Method, template: String },

    /// A `:` marker with nothing after it, e.g. `/users/:`.
    #[error("empty parameter name at segment {position} of {template}")]
    EmptyParamName { template: String, position: usize },

    /// The same parameter name appears twice in one template.
    #[error("parameter `{name}` declared more than once in {template}")]
    DuplicateParam { template: String, name: String },
}
