//! The network seam between adapters and the outside world.
//!
//! [`HttpTransport`] executes requests with reqwest. [`MockTransport`] replays scripted
//! responses and records what it was sent, for tests and offline runs.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Request};
use tracing::{debug, error, info, trace};

use crate::error::{Error, Result};
use crate::lock_unpoisoned;

/// Status and body of a provider response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResponse {
    pub status: u16,
    pub body: String,
}

impl WireResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and returns the raw response
    ///
    /// Non-success statuses are returned as responses, not errors; only transport
    /// failures are errors here.
    async fn execute(&self, request: Request) -> Result<WireResponse>;
}

/// HTTP Transport implementation for making API requests to LLM providers
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a new HTTP transport with default configuration
    ///
    /// # Examples
    ///
    /// ```
    /// use parley_core::transport::HttpTransport;
    ///
    /// let transport = HttpTransport::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new HTTP transport with a custom client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: Request) -> Result<WireResponse> {
        debug!("Sending HTTP request: {} {}", request.method(), request.url());
        let response = match self.client.execute(request).await {
            Ok(resp) => {
                info!("Received response with status: {}", resp.status());
                trace!("Response headers: {:#?}", resp.headers());
                resp
            }
            Err(e) => {
                error!("HTTP request failed: {}", e);
                return Err(Error::Transport(e));
            }
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to read response body: {}", e);
                return Err(Error::Transport(e));
            }
        };

        Ok(WireResponse { status, body })
    }
}

/// One scripted reply of a [`MockTransport`]
#[derive(Debug, Clone)]
pub struct MockReply {
    pub response: WireResponse,
    /// Simulated round-trip time
    pub delay: Duration,
}

/// Request as observed by a [`MockTransport`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: serde_json::Value,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Mock transport for testing
///
/// Replies are consumed in order. When the script runs out, requests answer with
/// HTTP 500.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful response with the given body
    pub fn push_ok(&self, body: impl Into<String>) -> &Self {
        self.push_reply(WireResponse::ok(body), Duration::ZERO)
    }

    /// Queues an arbitrary response delivered after `delay`
    pub fn push_reply(&self, response: WireResponse, delay: Duration) -> &Self {
        lock_unpoisoned(&self.replies).push_back(MockReply { response, delay });
        self
    }

    /// Every request executed so far, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock_unpoisoned(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock_unpoisoned(&self.requests).len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: Request) -> Result<WireResponse> {
        let body = request
            .body()
            .and_then(|body| body.as_bytes())
            .map(serde_json::from_slice::<serde_json::Value>)
            .transpose()
            .map_err(Error::RequestSerialization)?
            .unwrap_or(serde_json::Value::Null);
        let headers = request
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        lock_unpoisoned(&self.requests).push(RecordedRequest {
            url: request.url().to_string(),
            headers,
            body,
        });

        let reply = lock_unpoisoned(&self.replies).pop_front();
        match reply {
            Some(reply) => {
                if !reply.delay.is_zero() {
                    tokio::time::sleep(reply.delay).await;
                }
                Ok(reply.response)
            }
            None => Ok(WireResponse {
                status: 500,
                body: "no scripted reply".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::{Method, Url};

    fn request(body: &str) -> Request {
        let mut request = Request::new(
            Method::POST,
            Url::parse("https://example.test/chat/completions").unwrap(),
        );
        request
            .headers_mut()
            .insert("Content-Type", "application/json".parse().unwrap());
        *request.body_mut() = Some(body.to_string().into());
        request
    }

    #[test]
    fn test_wire_response_success_range() {
        assert!(WireResponse::ok("{}").is_success());
        assert!(!WireResponse { status: 404, body: String::new() }.is_success());
    }

    #[tokio::test]
    async fn test_mock_transport_replays_in_order_and_records() {
        let transport = MockTransport::new();
        transport.push_ok("first");
        transport.push_reply(
            WireResponse {
                status: 429,
                body: "slow down".to_string(),
            },
            Duration::ZERO,
        );

        let first = transport.execute(request(r#"{"n":1}"#)).await.unwrap();
        let second = transport.execute(request(r#"{"n":2}"#)).await.unwrap();
        let third = transport.execute(request(r#"{"n":3}"#)).await.unwrap();

        assert_eq!(first, WireResponse::ok("first"));
        assert_eq!(second.status, 429);
        assert_eq!(third.status, 500);

        let recorded = transport.requests();
        assert_eq!(recorded.len(), 3);
        assert_eq!(recorded[1].body["n"], 2);
        assert_eq!(recorded[0].url, "https://example.test/chat/completions");
        assert_eq!(recorded[0].header("content-type"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_http_transport_failure_is_transport_error() {
        let mut request = request("{}");
        // Rejected by the client before any socket is opened
        *request.url_mut() = Url::parse("ftp://example.test/chat/completions").unwrap();

        let error = HttpTransport::new().execute(request).await.unwrap_err();

        assert!(matches!(error, Error::Transport(_)));
        assert_eq!(error.user_message(), "Error: Network request failed");
    }
}
