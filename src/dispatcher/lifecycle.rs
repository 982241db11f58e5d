//! Per-request lifecycle.
//!
//! ```text
//! Receiving --on_end--> Routing --> Handling --> Responded
//!     |                                              ^
//!     +-- deadline passed / body too large ----------+
//! ```
//!
//! Body bytes are appended in the order the transport delivers them. Nothing
//! is parsed and no handler runs until [`Exchange::on_end`].

use http::Method;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

use super::core::{Dispatcher, HandlerError};
use super::response::{Reply, ResponseEnvelope};
use crate::ids::RequestId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Receiving,
    Routing,
    Handling,
    Responded,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    #[error("exchange is no longer receiving (state: {state:?})")]
    NotReceiving { state: ExchangeState },
    #[error("request body not received within {timeout_ms}ms")]
    TimedOut { timeout_ms: u128 },
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },
}

/// One request moving through the dispatcher.
///
/// Created by [`Dispatcher::begin`].
#[derive(Debug)]
pub struct Exchange {
    dispatcher: Dispatcher,
    request_id: RequestId,
    method: Method,
    raw_path: String,
    buffer: Vec<u8>,
    state: ExchangeState,
    started: Instant,
    early_reply: Option<Reply>,
}

impl Exchange {
    pub(crate) fn new(
        dispatcher: Dispatcher,
        request_id: RequestId,
        method: Method,
        raw_path: String,
    ) -> Self {
        debug!(request_id = %request_id, method = %method, path = %raw_path, "Exchange started");
        Self {
            dispatcher,
            request_id,
            method,
            raw_path,
            buffer: Vec::new(),
            state: ExchangeState::Receiving,
            started: Instant::now(),
            early_reply: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> ExchangeState {
        self.state
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[must_use]
    pub fn received_bytes(&self) -> usize {
        self.buffer.len()
    }

    fn timed_out(&self, now: Instant) -> bool {
        now.duration_since(self.started) > self.dispatcher.config().body_timeout
    }

    fn respond_early(&mut self, envelope: ResponseEnvelope) {
        self.buffer = Vec::new();
        self.early_reply = Some(Reply::from_envelope(envelope));
        self.state = ExchangeState::Responded;
    }

    fn respond_timeout(&mut self) -> ExchangeError {
        let timeout_ms = self.dispatcher.config().body_timeout.as_millis();
        warn!(
            request_id = %self.request_id,
            path = %self.raw_path,
            timeout_ms = timeout_ms,
            received_bytes = self.buffer.len(),
            "Request body timed out"
        );
        self.respond_early(ResponseEnvelope::reason(
            408,
            format!("Request body not received within {timeout_ms}ms"),
        ));
        ExchangeError::TimedOut { timeout_ms }
    }

    /// Append a chunk of body bytes.
    ///
    /// # Errors
    ///
    /// - [`ExchangeError::NotReceiving`] once the exchange left Receiving
    /// - [`ExchangeError::TimedOut`] / [`ExchangeError::BodyTooLarge`]: the
    ///   exchange has responded (408 / 413); call [`on_end`](Self::on_end)
    ///   to collect that reply
    pub fn on_data(&mut self, chunk: &[u8]) -> Result<(), ExchangeError> {
        if self.state != ExchangeState::Receiving {
            return Err(ExchangeError::NotReceiving { state: self.state });
        }
        if self.timed_out(Instant::now()) {
            return Err(self.respond_timeout());
        }
        let limit = self.dispatcher.config().max_body_bytes;
        if self.buffer.len() + chunk.len() > limit {
            warn!(
                request_id = %self.request_id,
                path = %self.raw_path,
                limit = limit,
                received_bytes = self.buffer.len() + chunk.len(),
                "Request body too large"
            );
            self.respond_early(ResponseEnvelope::reason(
                413,
                format!("Request body exceeds {limit} bytes"),
            ));
            return Err(ExchangeError::BodyTooLarge { limit });
        }
        self.buffer.extend_from_slice(chunk);
        Ok(())
    }

    /// Force the receive deadline, e.g. from a transport timer.
    ///
    /// No-op unless the exchange is still receiving.
    pub fn expire(&mut self) {
        if self.state == ExchangeState::Receiving {
            let _ = self.respond_timeout();
        }
    }

    /// End of body: route, handle and return the reply.
    ///
    /// Returns the 408/413 reply instead if the exchange already responded
    /// early.
    ///
    /// # Errors
    ///
    /// [`ExchangeError::NotReceiving`] if the reply was already collected.
    pub fn on_end(&mut self) -> Result<Reply, ExchangeError> {
        match self.state {
            ExchangeState::Receiving => {
                if self.timed_out(Instant::now()) {
                    self.respond_timeout();
                    return self
                        .early_reply
                        .take()
                        .ok_or(ExchangeError::NotReceiving { state: self.state });
                }
                self.state = ExchangeState::Routing;
                let body = std::mem::take(&mut self.buffer);
                self.state = ExchangeState::Handling;
                let reply = self.dispatcher.route_and_handle(
                    self.request_id,
                    self.method.clone(),
                    self.raw_path.clone(),
                    &body,
                );
                self.state = ExchangeState::Responded;
                Ok(reply)
            }
            ExchangeState::Responded if self.early_reply.is_some() => self
                .early_reply
                .take()
                .ok_or(ExchangeError::NotReceiving { state: self.state }),
            state => Err(ExchangeError::NotReceiving { state }),
        }
    }

    /// [`on_end`](Self::on_end), with a second collection turned into a
    /// 500 envelope.
    #[must_use]
    pub fn finish(mut self) -> Reply {
        self.on_end().unwrap_or_else(|e| {
            Reply::from_envelope(ResponseEnvelope::failure(
                500,
                &HandlerError::new("ExchangeError", e.to_string()),
            ))
        })
    }
}
