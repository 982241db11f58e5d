//! Response builder and the `{code, message, data}` envelope.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use super::core::HandlerError;

/// Reason phrase used when a code has no standard one.
pub const UNKNOWN_REASON: &str = "Unknown Status";

/// Media type of every response.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Standard reason phrase for `status`.
#[must_use]
pub fn status_reason(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or(UNKNOWN_REASON)
}

/// The uniform wire body.
///
/// `message` is always derived from `code`; there is no way to set it
/// separately.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    code: u16,
    message: &'static str,
    data: Value,
}

impl ResponseEnvelope {
    #[must_use]
    pub fn new(code: u16, data: Value) -> Self {
        Self {
            code,
            message: status_reason(code),
            data,
        }
    }

    /// Envelope for a failure caught at the dispatch boundary.
    #[must_use]
    pub fn failure(code: u16, err: &HandlerError) -> Self {
        Self::new(code, json!({ "name": err.name, "message": err.message }))
    }

    /// Envelope for a framework-generated rejection (`data: {reason}`).
    #[must_use]
    pub fn reason(code: u16, reason: impl Into<String>) -> Self {
        Self::new(code, json!({ "reason": reason.into() }))
    }

    #[must_use]
    pub fn code(&self) -> u16 {
        self.code
    }

    #[must_use]
    pub fn message(&self) -> &'static str {
        self.message
    }

    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }
}

/// A finalised response, ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    envelope: ResponseEnvelope,
    body: Vec<u8>,
}

impl Reply {
    #[must_use]
    pub fn from_envelope(envelope: ResponseEnvelope) -> Self {
        // Serialising a `Value` payload cannot fail.
        let body = serde_json::to_vec(&envelope).unwrap_or_default();
        Self { envelope, body }
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.envelope.code
    }

    #[must_use]
    pub fn reason(&self) -> &'static str {
        self.envelope.message
    }

    #[must_use]
    pub fn content_type(&self) -> &'static str {
        JSON_CONTENT_TYPE
    }

    #[must_use]
    pub fn envelope(&self) -> &ResponseEnvelope {
        &self.envelope
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    #[must_use]
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// Parse the body back into JSON.
    ///
    /// # Errors
    ///
    /// Never fails for replies built by this crate.
    pub fn body_json(&self) -> serde_json::Result<Value> {
        serde_json::from_slice(&self.body)
    }
}

/// Handed to every handler to build its response.
///
/// [`status`](Self::status) sets the pending code; [`json`](Self::json)
/// finalises the response exactly once.
#[derive(Debug)]
pub struct Responder {
    status: u16,
    reason: &'static str,
    reply: Option<Reply>,
}

impl Default for Responder {
    fn default() -> Self {
        Self::new()
    }
}

impl Responder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: 200,
            reason: status_reason(200),
            reply: None,
        }
    }

    /// Set the pending status code.
    pub fn status(&mut self, code: u16) -> &mut Self {
        self.status = code;
        self.reason = status_reason(code);
        self
    }

    #[must_use]
    pub fn pending_status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn pending_reason(&self) -> &'static str {
        self.reason
    }

    /// Whether [`json`](Self::json) already succeeded.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.reply.is_some()
    }

    /// Finalise the response with `data` as the envelope payload.
    ///
    /// # Errors
    ///
    /// - `DoubleResponseError` if a response was already finalised; the
    ///   first response is kept untouched
    /// - `InvalidStatusCode` if the pending status is outside 100..=999
    /// - `SerializationError` if `data` cannot be represented as JSON
    pub fn json<T: Serialize>(&mut self, data: T) -> Result<(), HandlerError> {
        if let Some(sent) = &self.reply {
            warn!(
                first_status = sent.status(),
                attempted_status = self.status,
                "Response already sent - ignoring second finalisation"
            );
            return Err(HandlerError::new(
                "DoubleResponseError",
                "response has already been sent",
            ));
        }
        if !(100..=999).contains(&self.status) {
            return Err(HandlerError::new(
                "InvalidStatusCode",
                format!("invalid status code: {}", self.status),
            ));
        }
        let data = serde_json::to_value(data)
            .map_err(|e| HandlerError::new("SerializationError", e.to_string()))?;
        self.reply = Some(Reply::from_envelope(ResponseEnvelope::new(self.status, data)));
        Ok(())
    }

    pub(crate) fn take_reply(&mut self) -> Option<Reply> {
        self.reply.take()
    }
}
