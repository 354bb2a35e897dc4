//! Axum extractor for trace context from propagation headers.
//!
//! Reads `x-trace-id` and `x-parent-span-id`. Unlike an interior hop, the
//! services using this crate are valid trace entry points, so a request
//! without propagation headers starts a fresh trace instead of being
//! rejected. Malformed ids are treated as absent.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;
use uuid::Uuid;

use crate::context::{TraceContext, PARENT_SPAN_ID_HEADER, TRACE_ID_HEADER};

/// Axum extractor that reads trace context from HTTP headers, creating a
/// fresh root context when none is carried.
pub struct TraceContextExtractor(pub TraceContext);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for TraceContextExtractor {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;

        let trace_id = headers
            .get(TRACE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok());

        let parent_span_id = headers
            .get(PARENT_SPAN_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok());

        let ctx = match trace_id {
            Some(trace_id) => TraceContext {
                trace_id,
                parent_span_id,
            },
            None => {
                if headers.contains_key(TRACE_ID_HEADER) {
                    tracing::debug!("malformed {} header, starting fresh trace", TRACE_ID_HEADER);
                }
                TraceContext::new_root()
            }
        };

        Ok(Self(ctx))
    }
}
