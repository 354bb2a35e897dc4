//! Trace context propagated between hops of a multi-service call chain.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::span::SpanId;

/// Header carrying the trace identifier across service boundaries.
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Header carrying the caller's span id, which becomes the parent of the
/// receiving service's root span.
pub const PARENT_SPAN_ID_HEADER: &str = "x-parent-span-id";

/// Identifiers linking this service's spans into the originating trace.
///
/// Extracted from inbound propagation headers, or freshly created when
/// this service is the first hop. Injected into outbound calls so the
/// next hop continues the same trace as a child.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TraceContext {
    pub trace_id: Uuid,
    /// Span id of the upstream caller, if any.
    pub parent_span_id: Option<SpanId>,
}

impl TraceContext {
    /// Start a fresh trace with no upstream caller.
    pub fn new_root() -> Self {
        Self {
            trace_id: Uuid::new_v4(),
            parent_span_id: None,
        }
    }

    /// Derive the context for a downstream hop parented to `span`.
    pub fn child_of(&self, span: SpanId) -> Self {
        Self {
            trace_id: self.trace_id,
            parent_span_id: Some(span),
        }
    }

    /// Header name/value pairs to inject into an outbound request.
    pub fn header_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![(TRACE_ID_HEADER, self.trace_id.to_string())];
        if let Some(parent) = self.parent_span_id {
            pairs.push((PARENT_SPAN_ID_HEADER, parent.to_string()));
        }
        pairs
    }
}
