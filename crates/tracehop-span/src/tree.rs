//! Exportable span tree, assembled from the flat arena when a request
//! completes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::span::{Span, SpanId, SpanState};
use crate::store::SpanStore;

/// One node of the exported tree: the span's recorded fields plus its
/// children nested in creation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanNode {
    pub id: SpanId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<SpanId>,
    pub name: String,
    pub annotations: HashMap<String, String>,
    pub metadata: HashMap<String, serde_json::Value>,
    pub state: SpanState,
    pub started_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    pub children: Vec<SpanNode>,
}

impl SpanNode {
    fn from_span(span: &Span) -> Self {
        Self {
            id: span.id,
            parent_id: span.parent_id,
            name: span.name.clone(),
            annotations: span.annotations.clone(),
            metadata: span.metadata.clone(),
            state: span.state,
            started_at: span.started_at,
            ended_at: span.ended_at,
            duration_ms: span.duration_ms,
            children: Vec::new(),
        }
    }

    /// Depth-first search by span name.
    pub fn find(&self, name: &str) -> Option<&SpanNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    fn count(&self) -> usize {
        1 + self.children.iter().map(SpanNode::count).sum::<usize>()
    }

    fn closed(&self) -> bool {
        self.state == SpanState::Closed && self.children.iter().all(SpanNode::closed)
    }
}

/// The full tree of spans for one request, handed off for export when the
/// root span closes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanTree {
    pub trace_id: Uuid,
    pub root: SpanNode,
}

impl SpanTree {
    /// Assemble the nested tree from the flat arena. Children appear in
    /// the order their spans were opened.
    pub fn from_store(store: &SpanStore) -> Self {
        let mut children: HashMap<SpanId, Vec<SpanNode>> = HashMap::new();
        // Spans iterate in insertion order; build leaves-last by walking
        // the order backwards so each node's children are complete when
        // the node itself is attached to its parent.
        let spans: Vec<&Span> = store.iter().collect();
        let mut nodes: HashMap<SpanId, SpanNode> = spans
            .iter()
            .map(|&s| (s.id, SpanNode::from_span(s)))
            .collect();

        for span in spans.iter().rev() {
            if span.id == store.root_id() {
                continue;
            }
            let mut node = match nodes.remove(&span.id) {
                Some(node) => node,
                None => continue,
            };
            if let Some(mut kids) = children.remove(&span.id) {
                kids.reverse();
                node.children = kids;
            }
            if let Some(parent) = span.parent_id {
                children.entry(parent).or_default().push(node);
            }
        }

        let root_id = store.root_id();
        let mut root = nodes.remove(&root_id).unwrap_or_else(|| {
            // Arena is seeded with its root, so this branch is unreachable;
            // a placeholder beats a panic in an export path.
            SpanNode::from_span(&Span::new(None, "missing-root"))
        });
        if let Some(mut kids) = children.remove(&root_id) {
            kids.reverse();
            root.children = kids;
        }

        Self {
            trace_id: store.trace_id(),
            root,
        }
    }

    /// Total number of spans in the tree.
    pub fn span_count(&self) -> usize {
        self.root.count()
    }

    /// True when every span in the tree is closed.
    pub fn all_closed(&self) -> bool {
        self.root.closed()
    }

    /// Depth-first search by span name.
    pub fn find(&self, name: &str) -> Option<&SpanNode> {
        self.root.find(name)
    }
}
