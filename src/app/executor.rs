use crate::app::case::Method;
use crate::app::error::Error;
use crate::configuration::constants::common::EXCERPT_LENGTH;
use crate::connection::{TimedRequest, Transport};
use bytes::Bytes;
use http::HeaderMap;
use http::Request as HttpRequest;
use http::Response as HttpResponse;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// A case after templating: everything needed to hit the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
    pub headers: BTreeMap<String, String>,
    pub timeout: Duration,
}

#[derive(Debug)]
pub struct Exchange {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
    parsed: Result<Value, String>,
    pub elapsed: Duration,
}

/// Normalized result of one request. Transport problems never escape as
/// anything but [`Outcome::Failed`].
#[derive(Debug)]
pub enum Outcome {
    Response(Exchange),
    Failed(Error),
}

pub struct Executor<C> {
    client: C,
    base_url: String,
}

pub fn excerpt(text: &str) -> String {
    let mut chars = text.chars();
    let mut short: String = chars.by_ref().take(EXCERPT_LENGTH).collect();
    if chars.next().is_some() {
        short.push_str("...");
    }
    short
}

impl Exchange {
    pub fn new(status: u16, headers: HeaderMap, body: String, elapsed: Duration) -> Self {
        let parsed = serde_json::from_str(&body).map_err(|e| e.to_string());
        Self {
            status,
            headers,
            body,
            parsed,
            elapsed,
        }
    }

    fn from_response(response: HttpResponse<Bytes>, elapsed: Duration) -> Self {
        let (parts, body) = response.into_parts();
        let body = String::from_utf8_lossy(&body).into_owned();
        Self::new(parts.status.as_u16(), parts.headers, body, elapsed)
    }

    pub fn json(&self) -> Option<&Value> {
        self.parsed.as_ref().ok()
    }

    pub fn decode(&self) -> Result<&Value, Error> {
        self.parsed.as_ref().map_err(|reason| Error::Decode {
            reason: reason.clone(),
            excerpt: self.excerpt(),
        })
    }

    pub fn excerpt(&self) -> String {
        excerpt(&self.body)
    }
}

impl<C> Executor<C>
where
    C: Transport,
{
    pub fn new(client: C, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    #[cfg(test)]
    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn execute(&self, request: &PreparedRequest) -> Outcome {
        let timed = match build(request) {
            Ok(timed) => timed,
            Err(e) => return Outcome::Failed(e),
        };
        let now = Instant::now();
        match self.client.send(timed) {
            Ok(response) => {
                let elapsed = now.elapsed();
                debug!(
                    "{} {} -> {} in {} ms",
                    request.method,
                    request.url,
                    response.status(),
                    elapsed.as_millis()
                );
                Outcome::Response(Exchange::from_response(response, elapsed))
            }
            Err(e) => {
                error!("Failed to send request {} {}: {}", request.method, request.url, e);
                Outcome::Failed(e)
            }
        }
    }
}

fn build(request: &PreparedRequest) -> Result<TimedRequest, Error> {
    let mut builder = HttpRequest::builder()
        .method(http::Method::from(request.method))
        .uri(request.url.as_str());
    for (key, value) in &request.headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    let body = match &request.body {
        Some(body) => serde_json::to_vec(body).map_err(|e| Error::Internal(e.to_string()))?,
        None => Vec::new(),
    };
    let request_data = builder
        .body(body)
        .map_err(|e| Error::Definition(format!("cannot build request {}: {}", request.url, e)))?;
    Ok(TimedRequest {
        request: request_data,
        timeout: request.timeout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::mock::ScriptedTransport;
    use serde_json::json;

    fn request(method: Method, url: &str, body: Option<Value>) -> PreparedRequest {
        PreparedRequest {
            method,
            url: url.to_owned(),
            body,
            headers: BTreeMap::new(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_base_url_is_joined_without_double_slash() {
        let executor = Executor::new(ScriptedTransport::new(), "http://localhost:3000/");
        assert_eq!(executor.url("/api/root"), "http://localhost:3000/api/root");
    }

    #[test]
    fn test_json_response_is_parsed() {
        let executor = Executor::new(
            ScriptedTransport::new().reply(200, r#"{"message":"Hello World"}"#),
            "http://target",
        );

        let outcome = executor.execute(&request(Method::Get, "http://target/api/root", None));

        match outcome {
            Outcome::Response(exchange) => {
                assert_eq!(exchange.status, 200);
                assert_eq!(exchange.json(), Some(&json!({"message": "Hello World"})));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_non_json_body_keeps_text_and_fails_decoding() {
        let executor = Executor::new(
            ScriptedTransport::new().reply(502, "<html>Bad Gateway</html>"),
            "http://target",
        );

        let outcome = executor.execute(&request(Method::Get, "http://target/api/root", None));

        match outcome {
            Outcome::Response(exchange) => {
                assert_eq!(exchange.body, "<html>Bad Gateway</html>");
                assert!(exchange.json().is_none());
                match exchange.decode() {
                    Err(Error::Decode { excerpt, .. }) => {
                        assert_eq!(excerpt, "<html>Bad Gateway</html>")
                    }
                    other => panic!("unexpected decode result {:?}", other),
                }
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_transport_errors_become_failed_outcomes() {
        let executor = Executor::new(
            ScriptedTransport::new().fail(Error::Timeout("deadline elapsed".to_owned())),
            "http://target",
        );

        let outcome = executor.execute(&request(Method::Get, "http://target/api/root", None));

        assert!(matches!(outcome, Outcome::Failed(Error::Timeout(_))));
    }

    #[test]
    fn test_body_headers_and_timeout_reach_the_transport() {
        let executor = Executor::new(ScriptedTransport::new().reply(200, "{}"), "http://target");
        let mut prepared = request(
            Method::Post,
            "http://target/api/status",
            Some(json!({"client_name": "test_client"})),
        );
        prepared
            .headers
            .insert("Content-Type".to_owned(), "application/json".to_owned());
        prepared.timeout = Duration::from_secs(30);

        executor.execute(&prepared);

        let sent = executor.client().sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, "POST");
        assert_eq!(sent[0].uri, "http://target/api/status");
        assert_eq!(sent[0].body, br#"{"client_name":"test_client"}"#.to_vec());
        assert_eq!(sent[0].timeout, Duration::from_secs(30));
        assert!(sent[0]
            .headers
            .contains(&("content-type".to_owned(), "application/json".to_owned())));
    }

    #[test]
    fn test_invalid_url_is_a_definition_error() {
        let executor = Executor::new(ScriptedTransport::new(), "http://target");

        let outcome = executor.execute(&request(Method::Get, "http://target/api/with space", None));

        assert!(matches!(outcome, Outcome::Failed(Error::Definition(_))));
        assert!(executor.client().sent.borrow().is_empty());
    }

    #[test]
    fn test_excerpt_is_bounded() {
        let long = "x".repeat(EXCERPT_LENGTH + 10);
        let short = excerpt(&long);
        assert_eq!(short.len(), EXCERPT_LENGTH + 3);
        assert!(short.ends_with("..."));
        assert_eq!(excerpt("tiny"), "tiny");
    }
}
