//! HTTP client for the downstream hop of the call chain.
//!
//! Serializes the current trace context into the outbound headers so the
//! receiving service continues the same trace as a child. Never retries;
//! retry policy belongs to a higher layer.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracehop_span::TraceContext;

use crate::error::ServiceError;

/// Expected JSON shape of a successful downstream reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainReply {
    pub message: String,
}

/// Client for calling the next service in the chain.
pub struct ChainClient {
    client: Client,
}

impl ChainClient {
    /// Create a client with the given request timeout.
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");
        Self { client }
    }

    /// GET `{destination}{path}` with trace context injected, returning
    /// the raw response body as text regardless of status. Fails with
    /// `Transport` on connection failure.
    pub async fn call(
        &self,
        trace: &TraceContext,
        destination: &str,
        path: &str,
    ) -> Result<String, ServiceError> {
        let url = format!("{destination}{path}");

        let mut request = self.client.get(&url);
        for (name, value) in trace.header_pairs() {
            request = request.header(name, value);
        }

        tracing::debug!(url = %url, trace_id = %trace.trace_id, "calling downstream hop");

        let response = request.send().await.map_err(|err| ServiceError::Transport {
            url: url.clone(),
            message: err.to_string(),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|err| ServiceError::Transport {
            url: url.clone(),
            message: err.to_string(),
        })?;

        tracing::debug!(url = %url, status = %status, "downstream hop replied");
        Ok(body)
    }

    /// [`call`](ChainClient::call), then decode the body as a
    /// [`ChainReply`]. Fails with `Decode` on malformed bodies.
    pub async fn call_json(
        &self,
        trace: &TraceContext,
        destination: &str,
        path: &str,
    ) -> Result<ChainReply, ServiceError> {
        let body = self.call(trace, destination, path).await?;
        serde_json::from_str(&body).map_err(|err| ServiceError::Decode(err.to_string()))
    }
}

impl Default for ChainClient {
    fn default() -> Self {
        Self::new(Duration::from_millis(5000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracehop_span::{PARENT_SPAN_ID_HEADER, TRACE_ID_HEADER};
    use uuid::Uuid;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_call_injects_propagation_headers() {
        let server = MockServer::start().await;
        let trace = TraceContext::new_root();
        let span = Uuid::new_v4();
        let outbound = trace.child_of(span);

        Mock::given(method("GET"))
            .and(path("/service-b"))
            .and(header(TRACE_ID_HEADER, trace.trace_id.to_string().as_str()))
            .and(header(PARENT_SPAN_ID_HEADER, span.to_string().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "boo"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChainClient::default();
        let reply = client
            .call_json(&outbound, &server.uri(), "/service-b")
            .await
            .unwrap();
        assert_eq!(reply.message, "boo");
    }

    #[tokio::test]
    async fn test_non_success_status_still_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/error"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client = ChainClient::default();
        let body = client
            .call(&TraceContext::new_root(), &server.uri(), "/error")
            .await
            .unwrap();
        assert_eq!(body, "bad gateway");
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/service-b"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = ChainClient::default();
        let err = client
            .call_json(&TraceContext::new_root(), &server.uri(), "/service-b")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Decode(_)));
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let client = ChainClient::new(Duration::from_millis(500));
        let err = client
            .call(&TraceContext::new_root(), "http://127.0.0.1:1", "/service-b")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Transport { .. }));
    }
}
