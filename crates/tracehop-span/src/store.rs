//! Per-request span arena.
//!
//! Spans are stored flat, indexed by id, with parent links as ids rather
//! than live references. The arena is exclusively owned by the task
//! handling one request; there is no cross-request sharing.

use std::collections::HashMap;
use uuid::Uuid;

use crate::error::SpanError;
use crate::span::{Span, SpanId};

/// Arena of spans for a single request's trace.
///
/// Exactly one span is the root. Every other span's parent must already
/// exist in the arena at insertion time, which rules out cycles and
/// dangling parents by construction.
#[derive(Debug)]
pub struct SpanStore {
    trace_id: Uuid,
    root_id: SpanId,
    spans: HashMap<SpanId, Span>,
    /// Insertion order, for deterministic export.
    order: Vec<SpanId>,
}

impl SpanStore {
    /// Create a store seeded with its root span.
    pub fn new(trace_id: Uuid, root: Span) -> Self {
        let root_id = root.id;
        let mut spans = HashMap::new();
        spans.insert(root_id, root);
        Self {
            trace_id,
            root_id,
            spans,
            order: vec![root_id],
        }
    }

    pub fn trace_id(&self) -> Uuid {
        self.trace_id
    }

    pub fn root_id(&self) -> SpanId {
        self.root_id
    }

    /// Insert a child span. The parent must exist in this arena.
    pub fn insert(&mut self, span: Span) -> Result<SpanId, SpanError> {
        match span.parent_id {
            Some(parent) if self.spans.contains_key(&parent) => {}
            Some(parent) => return Err(SpanError::InvalidParent { id: parent }),
            None => return Err(SpanError::InvalidParent { id: self.root_id }),
        }
        let id = span.id;
        self.spans.insert(id, span);
        self.order.push(id);
        Ok(id)
    }

    pub fn get(&self, id: SpanId) -> Option<&Span> {
        self.spans.get(&id)
    }

    pub fn get_mut(&mut self, id: SpanId) -> Option<&mut Span> {
        self.spans.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ids of spans still open, in insertion order.
    pub fn open_ids(&self) -> Vec<SpanId> {
        self.order
            .iter()
            .copied()
            .filter(|id| self.spans.get(id).map(Span::is_open).unwrap_or(false))
            .collect()
    }

    /// All spans in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Span> {
        self.order.iter().filter_map(|id| self.spans.get(id))
    }
}
