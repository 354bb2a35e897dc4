//! HTTP surface of the entry service.
//!
//! `/service-a` is the traced entry point. The downstream hops the demo
//! chain reaches (`/service-b`, `/timeout`, `/error`) are served here as
//! well, so a single instance whose destination resolves to itself
//! exercises the full chain end-to-end.

use axum::{
    extract::{Query, State},
    http::{header::HOST, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracehop_span::TraceContextExtractor;
use uuid::Uuid;

use crate::client::ChainClient;
use crate::context::RequestContext;
use crate::error::ServiceError;
use crate::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::resource::memory::standard_operations;
use crate::scenario;
use crate::{SERVICE_ID, SERVICE_VERSION};

/// Application state shared across routes.
pub struct AppState {
    pub orchestrator: Orchestrator,
    /// Scheme used to reach the downstream host named by the inbound
    /// `Host` header.
    pub downstream_scheme: String,
    /// Artificial delay served by the designated slow endpoint.
    pub slow_delay: Duration,
}

impl AppState {
    pub fn new(downstream_scheme: impl Into<String>, slow_delay: Duration, stage: &str) -> Self {
        Self {
            orchestrator: Orchestrator::new(
                standard_operations(stage),
                ChainClient::default(),
                OrchestratorConfig::default(),
            ),
            downstream_scheme: downstream_scheme.into(),
            slow_delay,
        }
    }
}

/// Create the router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/service-a", get(entry))
        .route("/service-b", get(downstream_reply))
        .route("/timeout", get(slow_endpoint))
        .route("/error", get(failing_endpoint))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::TimeoutFault => StatusCode::GATEWAY_TIMEOUT,
            ServiceError::Transport { .. } | ServiceError::Decode(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Operation { .. }
            | ServiceError::ExplicitFault
            | ServiceError::Span(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(serde_json::json!({
                "error": self.error_code(),
                "message": self.to_string()
            })),
        )
            .into_response()
    }
}

/// GET /service-a - traced entry point.
///
/// Builds the request context from the inbound parts (trace headers, the
/// `Host` header as downstream destination, the `n` selector query
/// parameter) and hands it to the orchestrator. The finalized span tree
/// is emitted on the export log line whether the run succeeded or not.
async fn entry(
    State(state): State<Arc<AppState>>,
    TraceContextExtractor(trace): TraceContextExtractor,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let host = match headers.get(HOST).and_then(|v| v.to_str().ok()) {
        Some(host) => host.to_string(),
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "MISSING_HOST",
                    "message": "Host header is required to resolve the downstream destination"
                })),
            )
                .into_response();
        }
    };

    let request_id = header_or(&headers, "x-request-id", || Uuid::new_v4().to_string());
    let account_id = header_or(&headers, "x-account-id", || "anonymous".to_string());
    let selector = scenario::selector_from_query(params.get("n").map(String::as_str));

    let ctx = RequestContext::new(
        trace,
        request_id,
        account_id,
        format!("{}://{}", state.downstream_scheme, host),
        uri.path(),
        selector,
    );

    tracing::info!(
        request_id = %ctx.request_id,
        trace_id = %ctx.trace.trace_id,
        selector = ctx.selector,
        "handling request"
    );

    let outcome = state.orchestrator.run(&ctx).await;

    // Export side channel: the completed tree goes out on a log line.
    match serde_json::to_string(&outcome.trace) {
        Ok(tree) => tracing::debug!(target: "trace_export", trace = %tree, "trace finalized"),
        Err(err) => tracing::warn!(error = %err, "failed to serialize trace for export"),
    }

    match outcome.result {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

fn header_or(headers: &HeaderMap, name: &str, default: impl FnOnce() -> String) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(default)
}

/// GET /service-b - downstream stand-in for the chained hop.
async fn downstream_reply() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "boo" }))
}

/// GET /timeout - designated slow endpoint.
async fn slow_endpoint(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    tokio::time::sleep(state.slow_delay).await;
    Json(serde_json::json!({ "message": "eventually" }))
}

/// GET /error - designated failing endpoint.
async fn failing_endpoint() -> impl IntoResponse {
    (
        StatusCode::BAD_GATEWAY,
        Json(serde_json::json!({
            "error": "DOWNSTREAM_FAILURE",
            "message": "downstream failure"
        })),
    )
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
}

/// GET /health - liveness endpoint.
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_ID.to_string(),
        version: SERVICE_VERSION.to_string(),
    })
}
