//! Test doubles: a throwaway TCP server for real round trips and a scripted
//! transport for everything that doesn't need a socket.

use crate::app::error::Error;
use crate::connection::{HttpResult, SendMessage, TimedRequest};
use bytes::Bytes;
use http::Response as HttpResponse;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

pub fn http_response(status_line: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    )
}

/// Serves `response` to the first connection and hands back the raw request head.
pub fn serve_once(response: String) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = vec![0u8; 16384];
        let n = stream.read(&mut buf).unwrap();
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        String::from_utf8_lossy(&buf[..n]).to_string()
    });
    (format!("http://{}", address), handle)
}

/// Accepts one connection and never answers.
pub fn silent_server(hold: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    thread::spawn(move || {
        if let Ok((_stream, _)) = listener.accept() {
            thread::sleep(hold);
        }
    });
    format!("http://{}", address)
}

/// Address nothing listens on.
pub fn unused_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", address)
}

#[derive(Debug, Clone)]
pub struct SentRequest {
    pub method: String,
    pub uri: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub timeout: Duration,
}

/// Replies from a queue, one entry per request. An empty queue answers
/// with a connection error.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: RefCell<VecDeque<HttpResult>>,
    pub sent: RefCell<Vec<SentRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, status: u16, body: &str) -> Self {
        self.reply_with_headers(status, body, &[])
    }

    pub fn reply_with_headers(self, status: u16, body: &str, headers: &[(&str, &str)]) -> Self {
        let mut builder = HttpResponse::builder().status(status);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let response = builder.body(Bytes::from(body.to_owned())).unwrap();
        self.replies.borrow_mut().push_back(Ok(response));
        self
    }

    pub fn fail(self, error: Error) -> Self {
        self.replies.borrow_mut().push_back(Err(error));
        self
    }
}

impl SendMessage<TimedRequest, HttpResult> for ScriptedTransport {
    fn send(&self, data: TimedRequest) -> HttpResult {
        let (parts, body) = data.request.into_parts();
        self.sent.borrow_mut().push(SentRequest {
            method: parts.method.to_string(),
            uri: parts.uri.to_string(),
            headers: parts
                .headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_owned()))
                .collect(),
            body,
            timeout: data.timeout,
        });
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Connection("connection refused".to_owned())))
    }
}
