use junction::dispatcher::{Dispatcher, HandlerError};
use junction::router::Router;
use junction::runtime_config::RuntimeConfig;
use junction::server::{listen, ServerHandle};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::mpsc;
use std::time::Duration;

mod common;
use common::http::{header, parse_response, request, send_in_parts, send_request};

fn start_service(config: RuntimeConfig) -> (ServerHandle, SocketAddr) {
    let mut router = Router::new();
    router
        .get("/health", |_, res| res.json(json!({ "ok": true })))
        .unwrap()
        .post("/users", |ctx, res| res.status(201).json(&ctx.body))
        .unwrap()
        .get("/users/:id", |ctx, res| res.json(json!({ "id": ctx.param("id") })))
        .unwrap()
        .delete("/users/:id", |_, _| {
            Err(HandlerError::new("ValidationError", "bad input"))
        })
        .unwrap();

    let (tx, rx) = mpsc::channel();
    let handle = listen(Dispatcher::with_config(router, config), 0, move |addr| {
        tx.send(addr).unwrap();
    })
    .unwrap();
    let bound = rx.recv().unwrap();
    assert_eq!(bound, handle.local_addr());
    (handle, SocketAddr::from(([127, 0, 0, 1], bound.port())))
}

fn test_config() -> RuntimeConfig {
    RuntimeConfig {
        stack_size: 0x8000,
        ..RuntimeConfig::default()
    }
}

#[test]
fn test_health_over_http() {
    let (handle, addr) = start_service(test_config());
    let resp = send_request(&addr, &request("GET", "/health?x=1", ""));
    handle.stop();

    let (status, status_line, body) = parse_response(&resp);
    assert_eq!(status, 200);
    // may_minihttp writes a fixed `200 Ok` line; the envelope carries the phrase
    assert!(status_line.starts_with("HTTP/1.1 200 "), "{status_line}");
    assert_eq!(body["message"], "OK");
    assert_eq!(header(&resp, "content-type"), Some("application/json"));
    assert_eq!(body, json!({ "code": 200, "message": "OK", "data": { "ok": true } }));
}

#[test]
fn test_post_body_over_http() {
    let (handle, addr) = start_service(test_config());
    let resp = send_request(&addr, &request("POST", "/users", r#"{"name":"Ada"}"#));
    handle.stop();

    let (status, status_line, body) = parse_response(&resp);
    assert_eq!(status, 201);
    assert_eq!(status_line, "HTTP/1.1 201 Created");
    assert_eq!(
        body,
        json!({ "code": 201, "message": "Created", "data": { "name": "Ada" } })
    );
}

#[test]
fn test_not_found_over_http() {
    let (handle, addr) = start_service(test_config());
    let resp = send_request(&addr, &request("PUT", "/users/1", "{}"));
    handle.stop();

    let (status, _, body) = parse_response(&resp);
    assert_eq!(status, 404);
    assert_eq!(body["data"]["reason"], "Cannot PUT to /users/1");
}

#[test]
fn test_handler_error_over_http() {
    let (handle, addr) = start_service(test_config());
    let resp = send_request(&addr, &request("DELETE", "/users/9", ""));
    handle.stop();

    let (status, status_line, body) = parse_response(&resp);
    assert_eq!(status, 500);
    assert_eq!(status_line, "HTTP/1.1 500 Internal Server Error");
    assert_eq!(
        body["data"],
        json!({ "name": "ValidationError", "message": "bad input" })
    );
}

#[test]
fn test_body_limit_over_http() {
    let (handle, addr) = start_service(RuntimeConfig {
        max_body_bytes: 16,
        ..test_config()
    });
    let payload = format!(r#"{{"name":"{}"}}"#, "a".repeat(64));
    let resp = send_request(&addr, &request("POST", "/users", &payload));
    handle.stop();

    let (status, _, body) = parse_response(&resp);
    assert_eq!(status, 413);
    assert_eq!(body["code"], 413);
}

#[test]
fn test_malformed_json_over_http() {
    let (handle, addr) = start_service(test_config());
    let resp = send_request(&addr, &request("POST", "/users", "{oops"));
    handle.stop();

    let (status, _, body) = parse_response(&resp);
    assert_eq!(status, 500);
    assert_eq!(body["data"]["name"], "BodyParseError");
}

#[test]
fn test_sequential_requests_on_one_server() {
    let (handle, addr) = start_service(test_config());
    for id in ["1", "abc", "x-y"] {
        let resp = send_request(&addr, &request("GET", &format!("/users/{id}"), ""));
        let (status, _, body) = parse_response(&resp);
        assert_eq!(status, 200);
        assert_eq!(body["data"]["id"], id);
    }
    handle.stop();
}

#[test]
fn test_slow_body_gets_408() {
    let (handle, addr) = start_service(RuntimeConfig {
        body_timeout: Duration::from_millis(100),
        ..test_config()
    });
    let head = "POST /users HTTP/1.1\r\nHost: localhost\r\nContent-Length: 20\r\n\r\n";
    let resp = send_in_parts(
        &addr,
        &[&format!("{head}{{\"na"), r#"me":"Ada","x":1}"#],
        Duration::from_millis(300),
    );
    handle.stop();

    let (status, status_line, body) = parse_response(&resp);
    assert_eq!(status, 408);
    assert_eq!(status_line, "HTTP/1.1 408 Request Timeout");
    assert_eq!(body["code"], 408);
    assert!(body["data"]["reason"]
        .as_str()
        .unwrap()
        .starts_with("Request body not received within 100ms"));
}
