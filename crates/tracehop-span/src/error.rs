//! Span-contract violations.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by span lifecycle operations.
///
/// These are programming-contract violations: callers are expected to log
/// and continue without the annotation rather than fail the whole request
/// where avoidable.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SpanError {
    /// The span has already been closed; annotations and metadata may only
    /// be attached while open.
    #[error("span {id} ('{name}') is already closed")]
    ClosedSpan { id: Uuid, name: String },

    /// The requested parent cannot accept children: it is closed or not
    /// part of this trace.
    #[error("span {id} cannot parent new spans (closed or unknown)")]
    InvalidParent { id: Uuid },

    /// The span id does not exist in this trace's arena.
    #[error("span {0} does not exist in this trace")]
    UnknownSpan(Uuid),
}
