use crate::dispatcher::{Dispatcher, Exchange, Reply, ResponseEnvelope};
use crate::ids::RequestId;
use http::Method;
use may_minihttp::{HttpService, Request, Response};
use std::io::{self, Read};
use tracing::{debug, warn};

const READ_CHUNK: usize = 4096;
const CONTENT_TYPE_HEADER: &str = "Content-Type: application/json";

/// `may_minihttp` service that feeds every request through a [`Dispatcher`].
#[derive(Clone, Debug)]
pub struct AppService {
    pub dispatcher: Dispatcher,
}

impl AppService {
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }
}

/// Copy the body reader into `exchange` chunk by chunk.
///
/// Stops at end of stream, on a transport error, or as soon as the exchange
/// refuses more data (408/413 already decided). Bytes left unread are the
/// transport's concern: `may_minihttp`'s body reader consumes the rest of the
/// declared `Content-Length` when dropped, which keeps the connection framed.
///
/// The receive deadline is only checked when a chunk arrives. A client that
/// stops sending altogether keeps this read blocked; the transport exposes no
/// per-request read timeout.
fn pump_body<R: Read>(mut body: R, exchange: &mut Exchange) {
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        match body.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if let Err(e) = exchange.on_data(&buf[..n]) {
                    debug!(request_id = %exchange.request_id(), error = %e, "Body receive stopped");
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(
                    request_id = %exchange.request_id(),
                    error = %e,
                    received_bytes = exchange.received_bytes(),
                    "Failed to read request body"
                );
                break;
            }
        }
    }
}

fn write_reply(res: &mut Response, reply: Reply) {
    res.status_code(usize::from(reply.status()), reply.reason());
    res.header(CONTENT_TYPE_HEADER);
    res.body_vec(reply.into_body());
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let method_str = req.method().to_string();
        let raw_path = req.path().to_string();

        let method = match method_str.parse::<Method>() {
            Ok(m) => m,
            Err(_) => {
                warn!(method = %method_str, path = %raw_path, "Unparseable request method");
                write_reply(
                    res,
                    Reply::from_envelope(ResponseEnvelope::reason(
                        400,
                        format!("Unsupported method token `{method_str}`"),
                    )),
                );
                return Ok(());
            }
        };

        let request_id = RequestId::from_header_or_new(
            req.headers()
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case("x-request-id"))
                .and_then(|h| std::str::from_utf8(h.value).ok()),
        );

        let mut exchange = self
            .dispatcher
            .begin_with_request_id(request_id, method, raw_path);
        pump_body(req.body(), &mut exchange);
        write_reply(res, exchange.finish());
        Ok(())
    }
}
