//! # Server Module
//!
//! HTTP transport built on `may_minihttp`. Every request is streamed into a
//! dispatcher [`Exchange`](crate::dispatcher::Exchange) and the resulting
//! envelope is written back with `Content-Type: application/json`.
//!
//! ```rust,no_run
//! use junction::dispatcher::Dispatcher;
//! use junction::router::Router;
//! use junction::server::listen;
//!
//! let mut router = Router::new();
//! router.get("/health", |_, res| res.json(serde_json::json!({ "ok": true }))).unwrap();
//!
//! let handle = listen(Dispatcher::new(router), 8080, |addr| println!("listening on {addr}")).unwrap();
//! handle.join().unwrap();
//! ```

mod http_server;
mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use service::AppService;

use crate::dispatcher::Dispatcher;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use tracing::info;

/// Resolve port 0 to a concrete free port so the handle reports a usable address.
fn resolve_port(port: u16) -> io::Result<u16> {
    if port != 0 {
        return Ok(port);
    }
    let probe = TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    Ok(probe.local_addr()?.port())
}

/// Bind `0.0.0.0:<port>`, wait until connections are accepted, then call
/// `on_ready` once with the bound address.
///
/// Port `0` picks a free port.
///
/// # Errors
///
/// Bind failures, or the listener not becoming ready.
pub fn listen<F>(dispatcher: Dispatcher, port: u16, on_ready: F) -> io::Result<ServerHandle>
where
    F: FnOnce(SocketAddr),
{
    may::config().set_stack_size(dispatcher.config().stack_size);

    let port = resolve_port(port)?;
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let routes = dispatcher.router().len();
    let handle = HttpServer(AppService::new(dispatcher)).start(addr)?;
    handle.wait_ready()?;

    info!(
        addr = %handle.local_addr(),
        routes_count = routes,
        "Server listening"
    );
    on_ready(handle.local_addr());
    Ok(handle)
}
