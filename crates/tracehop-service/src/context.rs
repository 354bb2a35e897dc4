//! Per-request context threaded through every component.
//!
//! One `RequestContext` is built at request entry and passed by reference;
//! nothing request-scoped lives in ambient state, so concurrent requests
//! share no mutable data.

use tracehop_span::TraceContext;

/// Everything a component needs to know about the request it is serving.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Trace identity carried from the upstream hop, or freshly started.
    pub trace: TraceContext,
    /// Unique id of this request; also used to key per-request writes.
    pub request_id: String,
    /// Account on whose behalf the request runs.
    pub account_id: String,
    /// Base URL of the host serving the downstream hops, e.g.
    /// `http://127.0.0.1:8080`.
    pub destination: String,
    /// Inbound request path, recorded on the root span.
    pub path: String,
    /// Scenario selector taken from the `n` query parameter.
    pub selector: f64,
}

impl RequestContext {
    pub fn new(
        trace: TraceContext,
        request_id: impl Into<String>,
        account_id: impl Into<String>,
        destination: impl Into<String>,
        path: impl Into<String>,
        selector: f64,
    ) -> Self {
        Self {
            trace,
            request_id: request_id.into(),
            account_id: account_id.into(),
            destination: destination.into(),
            path: path.into(),
            selector,
        }
    }
}
