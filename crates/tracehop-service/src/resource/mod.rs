//! Uniform interface over the backend side-effects the orchestrator fans
//! out to. Concrete backends are provided by the deployment environment;
//! the in-memory set in [`memory`] backs local runs and tests.

pub mod memory;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::context::RequestContext;
use crate::error::OperationError;

/// What a resource operation reports back for tracing: identifying
/// parameters as indexed annotations and the result body as metadata.
#[derive(Debug, Clone, Default)]
pub struct OperationResult {
    pub annotations: HashMap<String, String>,
    pub metadata: serde_json::Value,
}

impl OperationResult {
    pub fn new() -> Self {
        Self {
            annotations: HashMap::new(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_annotation(mut self, key: &str, value: impl Into<String>) -> Self {
        self.annotations.insert(key.to_string(), value.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// One backend side-effect the orchestrator invokes under its own span.
#[async_trait]
pub trait ResourceOperation: Send + Sync {
    /// Stable name, used as the span name for this operation.
    fn name(&self) -> &str;

    /// Perform the side-effect for this request.
    async fn execute(&self, ctx: &RequestContext) -> Result<OperationResult, OperationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_builder() {
        let result = OperationResult::new()
            .with_annotation("table", "records-dev")
            .with_metadata(serde_json::json!({"value": "test"}));
        assert_eq!(
            result.annotations.get("table"),
            Some(&"records-dev".to_string())
        );
        assert_eq!(result.metadata["value"], "test");
    }
}
