//! HTTP transport seam for push delivery.
//!
//! The sender only assembles requests and classifies responses; actually
//! talking to the push service is delegated to a [`PushTransport`]. The
//! default implementation uses reqwest. Tests substitute an in-memory one.

// Rust guideline compliant 2026-10

use async_trait::async_trait;
use url::Url;

use crate::error::{Error, Result};

/// A fully assembled push request (always POST).
#[derive(Debug, Clone)]
pub struct PushRequest {
    /// Subscription endpoint.
    pub endpoint: Url,
    /// Header name/value pairs, in insertion order.
    pub headers: Vec<(&'static str, String)>,
    /// Encrypted body. `None` for a payload-less push.
    pub body: Option<Vec<u8>>,
}

impl PushRequest {
    /// Value of the first header named `name` (ASCII case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw push service response.
#[derive(Debug, Clone, Default)]
pub struct PushResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers (non-UTF-8 values are dropped).
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Vec<u8>,
}

impl PushResponse {
    /// Value of the first header named `name` (ASCII case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Response body as lossy UTF-8, for diagnostics.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends a [`PushRequest`] and returns whatever the push service answered.
///
/// Implementations return `Ok` for every HTTP response, whatever the status,
/// and [`Error::Transport`] only when no response was obtained.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Deliver `request` to its endpoint.
    async fn send(&self, request: PushRequest) -> Result<PushResponse>;
}

/// reqwest-backed transport.
///
/// Reuse one instance across sends for connection pooling.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Transport with no request timeout of its own.
    ///
    /// Deadlines are set on [`PushSender`](crate::notifications::push::PushSender).
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Transport over an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PushTransport for ReqwestTransport {
    async fn send(&self, request: PushRequest) -> Result<PushResponse> {
        let mut builder = self.client.post(request.endpoint.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Transport(format!("push request failed: {e}")))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("failed to read push response: {e}")))?
            .to_vec();

        Ok(PushResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = PushResponse {
            status: 429,
            headers: vec![("retry-after".to_string(), "30".to_string())],
            body: Vec::new(),
        };
        assert_eq!(response.header("Retry-After"), Some("30"));
        assert_eq!(response.header("TTL"), None);

        let request = PushRequest {
            endpoint: Url::parse("https://push.example/x").expect("url"),
            headers: vec![("TTL", "60".to_string())],
            body: None,
        };
        assert_eq!(request.header("ttl"), Some("60"));
    }

    #[test]
    fn test_body_text_is_lossy() {
        let response = PushResponse {
            status: 400,
            headers: Vec::new(),
            body: vec![b'o', b'k', 0xFF],
        };
        assert_eq!(response.body_text(), "ok\u{FFFD}");
    }
}
