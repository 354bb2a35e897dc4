//! Request-scoped span tree types for tracehop services.
//!
//! This crate provides the per-request trace machinery a single
//! participating service needs: an arena of spans owned by one request,
//! a lifecycle manager that guarantees every opened span is closed, and
//! the propagation context carried between hops.
//!
//! # Span Hierarchy
//!
//! ```text
//! upstream hop (external, via x-parent-span-id)
//!   └─ root span (one per request)
//!       ├─ resource-operation spans (fan-out)
//!       └─ chain-call span (downstream hop)
//! ```
//!
//! # Usage
//!
//! 1. Use `TraceContextExtractor` in axum handlers to pick up (or start)
//!    the trace context from propagation headers.
//! 2. Use `SpanManager` to open, annotate, and close spans for each unit
//!    of work.
//! 3. Call `SpanManager::finish` when the request completes to obtain the
//!    exportable `SpanTree`.

pub mod context;
pub mod error;
pub mod extract;
pub mod manager;
pub mod span;
pub mod store;
pub mod tree;

pub use context::{TraceContext, PARENT_SPAN_ID_HEADER, TRACE_ID_HEADER};
pub use error::SpanError;
pub use extract::TraceContextExtractor;
pub use manager::SpanManager;
pub use span::{Span, SpanId, SpanState};
pub use store::SpanStore;
pub use tree::{SpanNode, SpanTree};
