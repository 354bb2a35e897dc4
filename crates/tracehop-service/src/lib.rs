//! Entry service of a multi-hop traced call chain.
//!
//! One request flows: scenario selection → fan-out to resource operations
//! → downstream chain call, every step wrapped in its own span so the
//! whole call graph exports as one connected trace.
//!
//! ## Architecture
//!
//! 1. **Scenario** (`scenario`): deterministic selector-to-path mapping,
//!    including the deliberate timeout/error fault paths.
//! 2. **Context** (`context`): per-request identity threaded by reference
//!    through every component; no ambient request state.
//! 3. **Resource** (`resource`): uniform async interface over backend
//!    side-effects, with in-memory backends for local runs and tests.
//! 4. **Client** (`client`): downstream hop with trace-context injection.
//! 5. **Orchestrator** (`orchestrator`): drives the selected scenario
//!    under span supervision; no exit path leaks an open span.
//! 6. **Handler** (`handler`): axum routes, including the downstream
//!    stand-ins that make a single instance self-chaining.

pub mod client;
pub mod context;
pub mod error;
pub mod handler;
pub mod orchestrator;
pub mod resource;
pub mod scenario;

pub use client::{ChainClient, ChainReply};
pub use context::RequestContext;
pub use error::{OperationError, ServiceError};
pub use handler::{create_router, AppState};
pub use orchestrator::{Orchestrator, OrchestratorConfig, RunOutcome, ServiceResponse};
pub use resource::{OperationResult, ResourceOperation};
pub use scenario::{select, selector_from_query, FaultKind, Scenario};

/// Service identifier reported by the health endpoint.
pub const SERVICE_ID: &str = "tracehop-service";

/// Service version (from Cargo.toml).
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
