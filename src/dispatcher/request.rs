//! Request context builder.
//!
//! Path parameters come from the matched route, query parameters from the raw
//! path, and the body is parsed as JSON once it is complete.

use http::Method;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::core::HandlerError;
use crate::ids::RequestId;
use crate::router::{strip_query, ParamVec};

/// The inbound request as seen by a handler.
///
/// Built once per request after the body is complete and the route table
/// has been consulted.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub method: Method,
    /// Path exactly as received, query string included.
    pub raw_path: String,
    /// Path without the query string.
    pub path: String,
    pub query: ParamVec,
    /// Parsed JSON body; an empty object when no body was sent.
    pub body: Value,
    /// Parameters of the matched route. Empty for the not-found handler.
    pub params: ParamVec,
}

impl RequestContext {
    pub(crate) fn new(
        request_id: RequestId,
        method: Method,
        raw_path: String,
        body: Value,
        params: ParamVec,
    ) -> Self {
        let path = strip_query(&raw_path).to_string();
        let query = parse_query_params(&raw_path);
        Self {
            request_id,
            method,
            raw_path,
            path,
            query,
            body,
            params,
        }
    }

    /// Get a path parameter by name.
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name. Repeated keys: the last one wins.
    #[inline]
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Note: this allocates - use `param()` in hot paths
    #[must_use]
    pub fn params_map(&self) -> HashMap<String, String> {
        self.params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    /// Note: this allocates - use `query_param()` in hot paths
    #[must_use]
    pub fn query_map(&self) -> HashMap<String, String> {
        self.query
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    /// Deserialize the body into `T`.
    ///
    /// # Errors
    ///
    /// `JsonError` when the body does not have the shape of `T`.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        Ok(T::deserialize(&self.body)?)
    }
}

/// Parse query string parameters from a URL path.
///
/// Names and values are percent/plus decoded. Order is preserved, so
/// lookups through [`RequestContext::query_param`] see the last repeat.
#[must_use]
pub fn parse_query_params(raw_path: &str) -> ParamVec {
    match raw_path.split_once('?') {
        Some((_, query)) => url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
            .collect(),
        None => ParamVec::new(),
    }
}

/// Parse a complete request body.
///
/// An empty body yields an empty JSON object.
///
/// # Errors
///
/// `BodyParseError` when the bytes are not valid JSON.
pub fn parse_body(bytes: &[u8]) -> Result<Value, HandlerError> {
    if bytes.is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => {
            debug!(body_size_bytes = bytes.len(), "JSON body parsed");
            Ok(value)
        }
        Err(e) => {
            debug!(body_size_bytes = bytes.len(), error = %e, "JSON body parse failed");
            Err(HandlerError::new("BodyParseError", e.to_string()))
        }
    }
}
