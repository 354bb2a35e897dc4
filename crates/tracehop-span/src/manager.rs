//! Span lifecycle manager.
//!
//! Enforces the open/close contract against the request's span arena:
//! children may only be opened under open parents, annotations attach only
//! to open spans, and closing is idempotent so overlapping success and
//! failure branches cannot double-fault.

use uuid::Uuid;

use crate::context::TraceContext;
use crate::error::SpanError;
use crate::span::{Span, SpanId};
use crate::store::SpanStore;
use crate::tree::SpanTree;

/// Creates, annotates, and closes spans for one request.
///
/// The root span is opened on construction and every other span is opened
/// through [`begin`](SpanManager::begin). Callers must close each span
/// they open before returning control; [`end_all_open`](SpanManager::end_all_open)
/// is the boundary guard that sweeps anything left behind on an error
/// path, with a warning per leaked span.
#[derive(Debug)]
pub struct SpanManager {
    store: SpanStore,
    begun: usize,
    ended: usize,
}

impl SpanManager {
    /// Open the root span for a request. When `trace` carries an upstream
    /// parent span id, the root is linked under it so the exported tree
    /// joins the caller's trace.
    pub fn new(trace: &TraceContext, root_name: &str) -> Self {
        let root = Span::new(trace.parent_span_id, root_name);
        Self {
            store: SpanStore::new(trace.trace_id, root),
            begun: 1,
            ended: 0,
        }
    }

    pub fn trace_id(&self) -> Uuid {
        self.store.trace_id()
    }

    pub fn root_id(&self) -> SpanId {
        self.store.root_id()
    }

    /// Open a new child span under `parent`.
    pub fn begin(&mut self, parent: SpanId, name: &str) -> Result<SpanId, SpanError> {
        match self.store.get(parent) {
            Some(span) if span.is_open() => {}
            Some(_) | None => return Err(SpanError::InvalidParent { id: parent }),
        }
        let id = self.store.insert(Span::new(Some(parent), name))?;
        self.begun += 1;
        Ok(id)
    }

    /// Attach an indexed key/value tag to an open span.
    ///
    /// Note: annotations on the root span are kept in the exported tree,
    /// but downstream exporters may index only child-span annotations, so
    /// treat root-level tags as best-effort.
    pub fn annotate(&mut self, span: SpanId, key: &str, value: &str) -> Result<(), SpanError> {
        self.store
            .get_mut(span)
            .ok_or(SpanError::UnknownSpan(span))?
            .annotate(key, value)
    }

    /// Attach unindexed auxiliary payload to an open span.
    pub fn add_metadata(
        &mut self,
        span: SpanId,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), SpanError> {
        self.store
            .get_mut(span)
            .ok_or(SpanError::UnknownSpan(span))?
            .add_metadata(key, value)
    }

    /// Close a span. Closing an already-closed span is a warning, not an
    /// error: overlapping success/failure branches may both reach their
    /// close call.
    pub fn end(&mut self, span: SpanId) {
        match self.store.get_mut(span) {
            Some(s) => {
                if s.close() {
                    self.ended += 1;
                } else {
                    tracing::warn!(span = %span, name = %s.name, "span already closed, ignoring duplicate end");
                }
            }
            None => {
                tracing::warn!(span = %span, "attempted to end a span not in this trace");
            }
        }
    }

    /// Boundary guard: close every span still open, children before the
    /// root, warning for each. A leaked open span would make the trace
    /// unexportable, so the orchestration boundary calls this on every
    /// exit path.
    pub fn end_all_open(&mut self) {
        let root = self.store.root_id();
        let mut open = self.store.open_ids();
        open.reverse();
        for id in open {
            if let Some(span) = self.store.get_mut(id) {
                if span.close() {
                    self.ended += 1;
                    if id != root {
                        tracing::warn!(span = %id, name = %span.name, "span left open at request boundary, force-closing");
                    }
                }
            }
        }
    }

    /// Number of spans currently open.
    pub fn open_count(&self) -> usize {
        self.store.open_ids().len()
    }

    /// True when every opened span has been closed.
    pub fn is_balanced(&self) -> bool {
        self.begun == self.ended && self.open_count() == 0
    }

    /// Opened/closed counters, for balance assertions.
    pub fn balance(&self) -> (usize, usize) {
        (self.begun, self.ended)
    }

    pub fn store(&self) -> &SpanStore {
        &self.store
    }

    /// Finalize the trace: sweep any remaining open spans and hand off the
    /// assembled tree for export.
    pub fn finish(mut self) -> SpanTree {
        self.end_all_open();
        SpanTree::from_store(&self.store)
    }
}
