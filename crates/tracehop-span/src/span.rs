//! Core span type: a timed, named unit of work inside one request's trace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::SpanError;

/// Identifier of a span within its trace.
pub type SpanId = Uuid;

/// Lifecycle state of a span. A span transitions open → closed exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanState {
    Open,
    Closed,
}

/// A single span in the request's trace.
///
/// Annotations are indexed key/value tags; metadata is unindexed auxiliary
/// payload. Both may only be attached while the span is open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    pub id: SpanId,
    /// Parent span id. `None` only for a root span whose caller is not
    /// part of this process (or for a trace-originating root).
    pub parent_id: Option<SpanId>,
    pub name: String,
    pub annotations: HashMap<String, String>,
    pub metadata: HashMap<String, serde_json::Value>,
    pub state: SpanState,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl Span {
    pub(crate) fn new(parent_id: Option<SpanId>, name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent_id,
            name: name.to_string(),
            annotations: HashMap::new(),
            metadata: HashMap::new(),
            state: SpanState::Open,
            started_at: Utc::now(),
            ended_at: None,
            duration_ms: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == SpanState::Open
    }

    /// Attach an indexed key/value tag. Fails on a closed span.
    pub(crate) fn annotate(&mut self, key: &str, value: &str) -> Result<(), SpanError> {
        self.check_open()?;
        self.annotations.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Attach unindexed auxiliary payload. Fails on a closed span.
    pub(crate) fn add_metadata(
        &mut self,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), SpanError> {
        self.check_open()?;
        self.metadata.insert(key.to_string(), value);
        Ok(())
    }

    /// Close the span. Returns `false` if it was already closed.
    pub(crate) fn close(&mut self) -> bool {
        if !self.is_open() {
            return false;
        }
        let now = Utc::now();
        self.state = SpanState::Closed;
        self.ended_at = Some(now);
        self.duration_ms = Some((now - self.started_at).num_milliseconds().max(0) as u64);
        true
    }

    fn check_open(&self) -> Result<(), SpanError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(SpanError::ClosedSpan {
                id: self.id,
                name: self.name.clone(),
            })
        }
    }
}
