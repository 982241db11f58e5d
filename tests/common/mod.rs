#![allow(dead_code)]

use junction::dispatcher::HandlerError;
use junction::{RequestContext, Responder};
use serde_json::json;

/// Handler that answers with its own name, for asserting which route won.
pub fn named(
    name: &'static str,
) -> impl Fn(&RequestContext, &mut Responder) -> Result<(), HandlerError> + Send + Sync + 'static {
    move |ctx, res| res.json(json!({ "handler": name, "params": ctx.params_map() }))
}

pub mod http {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// Write a raw request and read until the server goes quiet.
    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req.as_bytes()).unwrap();
        read_reply(stream)
    }

    fn read_reply(mut stream: TcpStream) -> String {
        stream
            .set_read_timeout(Some(Duration::from_millis(200)))
            .unwrap();
        let mut buf = Vec::new();
        loop {
            let mut tmp = [0u8; 1024];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read error: {:?}", e),
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Write `parts` one at a time with `pause` between them, then read the reply.
    pub fn send_in_parts(addr: &SocketAddr, parts: &[&str], pause: Duration) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                std::thread::sleep(pause);
            }
            stream.write_all(part.as_bytes()).unwrap();
            stream.flush().unwrap();
        }
        read_reply(stream)
    }

    pub fn request(method: &str, path: &str, body: &str) -> String {
        format!(
            "{method} {path} HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        )
    }

    /// Status code, status line and parsed JSON body.
    pub fn parse_response(resp: &str) -> (u16, String, serde_json::Value) {
        let (head, body) = resp.split_once("\r\n\r\n").unwrap_or((resp, ""));
        let status_line = head.lines().next().unwrap_or("").to_string();
        let status = status_line
            .split_whitespace()
            .nth(1)
            .unwrap_or("0")
            .parse()
            .unwrap_or(0);
        let json = serde_json::from_str(body).unwrap_or_default();
        (status, status_line, json)
    }

    pub fn header<'a>(resp: &'a str, name: &str) -> Option<&'a str> {
        let (head, _) = resp.split_once("\r\n\r\n")?;
        head.lines().skip(1).find_map(|line| {
            let (k, v) = line.split_once(':')?;
            k.trim().eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }
}
