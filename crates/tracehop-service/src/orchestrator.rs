//! Orchestration engine: drives resource operations and the downstream
//! chain call for one request, under span supervision.
//!
//! The structural guarantee of this module is that every span opened
//! during a run is closed exactly once by the time [`Orchestrator::run`]
//! returns, on the success path and on every failure path.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracehop_span::{SpanId, SpanManager, SpanTree};

use crate::client::ChainClient;
use crate::context::RequestContext;
use crate::error::{Result, ServiceError};
use crate::resource::ResourceOperation;
use crate::scenario::{self, FaultKind, Scenario};

/// Downstream paths the orchestrator drives per scenario.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Next hop on the normal path.
    pub chain_path: String,
    /// Designated slow endpoint for the timeout fault.
    pub timeout_path: String,
    /// Designated failing endpoint for the error fault.
    pub error_path: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            chain_path: "/service-b".to_string(),
            timeout_path: "/timeout".to_string(),
            error_path: "/error".to_string(),
        }
    }
}

impl OrchestratorConfig {
    /// Label of the chained service, derived from its path.
    fn chain_label(&self) -> &str {
        self.chain_path.trim_start_matches('/')
    }
}

/// Successful response payload for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceResponse {
    pub message: String,
}

/// What one orchestration run produced: the response (or error) and the
/// finalized trace, with every span closed.
#[derive(Debug)]
pub struct RunOutcome {
    pub result: Result<ServiceResponse>,
    pub trace: SpanTree,
}

/// Sequences resource operations and the chain call per the selected
/// scenario.
pub struct Orchestrator {
    operations: Vec<Arc<dyn ResourceOperation>>,
    chain: ChainClient,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        operations: Vec<Arc<dyn ResourceOperation>>,
        chain: ChainClient,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            operations,
            chain,
            config,
        }
    }

    /// Run one request to completion. Regardless of branch, the returned
    /// trace has every span closed.
    pub async fn run(&self, ctx: &RequestContext) -> RunOutcome {
        let mut spans = SpanManager::new(&ctx.trace, &ctx.path);
        let root = spans.root_id();

        // Root-level tags are best-effort; some exporters index only
        // child-span annotations.
        annotate_or_warn(&mut spans, root, "path", &ctx.path);
        metadata_or_warn(&mut spans, root, "selector", serde_json::json!(ctx.selector));

        let result = match scenario::select(ctx.selector) {
            Scenario::Normal => self.run_normal(ctx, &mut spans, root).await,
            Scenario::Fault(kind) => self.run_fault(ctx, &mut spans, root, kind).await,
        };

        if let Err(ref err) = result {
            tracing::warn!(request_id = %ctx.request_id, error = %err, "request failed");
        }

        // Boundary guard: nothing opened here may outlive the run.
        let trace = spans.finish();
        RunOutcome { result, trace }
    }

    /// Normal path: fan out to every configured resource operation, then
    /// chain to the next service.
    async fn run_normal(
        &self,
        ctx: &RequestContext,
        spans: &mut SpanManager,
        root: SpanId,
    ) -> Result<ServiceResponse> {
        // Open a span per operation up front so their intervals nest
        // inside the root while the operations run jointly.
        let mut pending: Vec<(SpanId, Arc<dyn ResourceOperation>)> = Vec::new();
        for op in &self.operations {
            let span = spans.begin(root, op.name())?;
            pending.push((span, Arc::clone(op)));
        }

        // Independent side-effects with no data dependency: issue them
        // concurrently and wait for all to settle. A failure among them
        // must not cancel siblings already in flight.
        let settled = join_all(pending.iter().map(|(_, op)| op.execute(ctx))).await;

        let mut first_failure: Option<ServiceError> = None;
        for ((span, op), outcome) in pending.into_iter().zip(settled) {
            match outcome {
                Ok(result) => {
                    for (key, value) in &result.annotations {
                        annotate_or_warn(spans, span, key, value);
                    }
                    metadata_or_warn(spans, span, "result", result.metadata);
                }
                Err(err) => {
                    metadata_or_warn(
                        spans,
                        span,
                        "error",
                        serde_json::json!(err.to_string()),
                    );
                    if first_failure.is_none() {
                        first_failure = Some(ServiceError::operation(op.name(), err));
                    }
                }
            }
            spans.end(span);
        }

        if let Some(err) = first_failure {
            return Err(err);
        }

        // Chain call: propagate trace context so the next hop continues
        // this trace as a child of the call span.
        let label = self.config.chain_label();
        let span = spans.begin(root, &format!("call-{label}"))?;
        annotate_or_warn(spans, span, "path", &self.config.chain_path);
        metadata_or_warn(spans, span, "selector", serde_json::json!(ctx.selector));

        let outbound = ctx.trace.child_of(span);
        let reply = self
            .chain
            .call_json(&outbound, &ctx.destination, &self.config.chain_path)
            .await;

        let reply = match reply {
            Ok(reply) => {
                metadata_or_warn(spans, span, "message", serde_json::json!(reply.message));
                spans.end(span);
                reply
            }
            Err(err) => {
                spans.end(span);
                return Err(err);
            }
        };

        Ok(ServiceResponse {
            message: format!("{label} says {}", reply.message),
        })
    }

    /// Fault path: reach the designated endpoint, close the span on both
    /// paths, then raise the deliberate fault.
    async fn run_fault(
        &self,
        ctx: &RequestContext,
        spans: &mut SpanManager,
        root: SpanId,
        kind: FaultKind,
    ) -> Result<ServiceResponse> {
        let (path, fault) = match kind {
            FaultKind::Timeout => (&self.config.timeout_path, ServiceError::TimeoutFault),
            FaultKind::Error => (&self.config.error_path, ServiceError::ExplicitFault),
        };
        let label = path.trim_start_matches('/');

        tracing::info!(request_id = %ctx.request_id, endpoint = %path, "exercising fault scenario");

        let span = spans.begin(root, &format!("call-{label}"))?;
        annotate_or_warn(spans, span, "path", path);

        let outbound = ctx.trace.child_of(span);
        let call = self.chain.call(&outbound, &ctx.destination, path).await;
        spans.end(span);

        // A transport failure reaching the endpoint takes precedence.
        call?;

        Err(fault)
    }
}

/// Span-contract violations on annotation are never fatal to the request:
/// log and continue without the tag.
fn annotate_or_warn(spans: &mut SpanManager, span: SpanId, key: &str, value: &str) {
    if let Err(err) = spans.annotate(span, key, value) {
        tracing::warn!(span = %span, key = %key, error = %err, "dropping annotation");
    }
}

fn metadata_or_warn(spans: &mut SpanManager, span: SpanId, key: &str, value: serde_json::Value) {
    if let Err(err) = spans.add_metadata(span, key, value) {
        tracing::warn!(span = %span, key = %key, error = %err, "dropping metadata");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OperationError;
    use crate::resource::{memory::standard_operations, OperationResult};
    use async_trait::async_trait;
    use tracehop_span::TraceContext;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FailingWrite;

    #[async_trait]
    impl ResourceOperation for FailingWrite {
        fn name(&self) -> &str {
            "write-object"
        }

        async fn execute(
            &self,
            _ctx: &RequestContext,
        ) -> std::result::Result<OperationResult, OperationError> {
            Err(OperationError::Write("store unavailable".to_string()))
        }
    }

    fn ctx_for(server: &MockServer, selector: f64) -> RequestContext {
        RequestContext::new(
            TraceContext::new_root(),
            "req-test",
            "acct-test",
            server.uri(),
            "/service-a",
            selector,
        )
    }

    async fn mock_service_b(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/service-b"))
            .and(header_exists("x-trace-id"))
            .and(header_exists("x-parent-span-id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "boo"
            })))
            .mount(server)
            .await;
    }

    fn orchestrator(operations: Vec<Arc<dyn ResourceOperation>>) -> Orchestrator {
        Orchestrator::new(
            operations,
            ChainClient::default(),
            OrchestratorConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_normal_path_chains_and_balances() {
        let server = MockServer::start().await;
        mock_service_b(&server).await;

        let orch = orchestrator(standard_operations("test"));
        let outcome = orch.run(&ctx_for(&server, 0.0)).await;

        let response = outcome.result.unwrap();
        assert_eq!(response.message, "service-b says boo");

        // root + four operations + one chain call, all closed
        assert_eq!(outcome.trace.span_count(), 6);
        assert!(outcome.trace.all_closed());
        assert!(outcome.trace.find("call-service-b").is_some());
    }

    #[tokio::test]
    async fn test_failed_write_propagates_but_closes_spans() {
        let server = MockServer::start().await;
        mock_service_b(&server).await;

        let mut ops = standard_operations("test");
        ops[1] = Arc::new(FailingWrite);
        let orch = orchestrator(ops);
        let outcome = orch.run(&ctx_for(&server, 0.0)).await;

        let err = outcome.result.unwrap_err();
        assert_eq!(err.error_code(), "OPERATION_FAILED");
        assert!(err.to_string().contains("write-object"));

        // No chain call happened; the operation spans are still closed.
        assert_eq!(outcome.trace.span_count(), 5);
        assert!(outcome.trace.all_closed());
        assert!(outcome.trace.find("call-service-b").is_none());
    }

    #[tokio::test]
    async fn test_timeout_fault_reaches_slow_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/timeout"))
            .respond_with(ResponseTemplate::new(200).set_body_string("slow reply"))
            .expect(1)
            .mount(&server)
            .await;

        let orch = orchestrator(standard_operations("test"));
        let outcome = orch.run(&ctx_for(&server, 1.5)).await;

        assert_eq!(outcome.result.unwrap_err().to_string(), "timed out");
        assert!(outcome.trace.all_closed());
        assert!(outcome.trace.find("call-timeout").is_some());
    }

    #[tokio::test]
    async fn test_error_fault_reaches_failing_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/error"))
            .respond_with(ResponseTemplate::new(502).set_body_string("downstream failure"))
            .expect(1)
            .mount(&server)
            .await;

        let orch = orchestrator(standard_operations("test"));
        let outcome = orch.run(&ctx_for(&server, 3.0)).await;

        assert_eq!(outcome.result.unwrap_err().to_string(), "boom");
        assert!(outcome.trace.all_closed());
        assert!(outcome.trace.find("call-error").is_some());
    }

    #[tokio::test]
    async fn test_unreachable_chain_is_transport_error_with_closed_spans() {
        let orch = orchestrator(standard_operations("test"));
        let ctx = RequestContext::new(
            TraceContext::new_root(),
            "req-test",
            "acct-test",
            "http://127.0.0.1:1",
            "/service-a",
            0.0,
        );
        let outcome = orch.run(&ctx).await;

        let err = outcome.result.unwrap_err();
        assert_eq!(err.error_code(), "TRANSPORT_ERROR");
        assert!(outcome.trace.all_closed());
    }
}
