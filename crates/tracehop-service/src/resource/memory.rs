//! In-memory resource backends for local runs and tests.
//!
//! Each backend mirrors one of the fan-out side-effects of the demo
//! deployment: topic publish, object write with a read-before-write
//! probe, record read-then-write, and a request/response function
//! invocation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{OperationResult, ResourceOperation};
use crate::context::RequestContext;
use crate::error::OperationError;

/// Publishes a notification message to a named topic.
pub struct TopicPublish {
    topic: String,
    log: Arc<Mutex<Vec<String>>>,
}

impl TopicPublish {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn published(&self) -> Vec<String> {
        self.log.lock().await.clone()
    }
}

#[async_trait]
impl ResourceOperation for TopicPublish {
    fn name(&self) -> &str {
        "publish-notification"
    }

    async fn execute(&self, _ctx: &RequestContext) -> Result<OperationResult, OperationError> {
        let message = "test";
        tracing::info!(topic = %self.topic, "publishing notification");
        self.log.lock().await.push(message.to_string());

        Ok(OperationResult::new()
            .with_annotation("topic", &self.topic)
            .with_metadata(serde_json::json!({ "message": message })))
    }
}

/// Writes a per-request object, probing first for an existing one.
///
/// The probe is a read-before-write check: a miss is the expected case on
/// a fresh request id and is swallowed here, never surfaced to the
/// orchestrator.
pub struct ObjectWrite {
    bucket: String,
    objects: Arc<Mutex<HashMap<String, String>>>,
}

impl ObjectWrite {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn object(&self, key: &str) -> Option<String> {
        self.objects.lock().await.get(key).cloned()
    }

    async fn probe(&self, key: &str) -> Result<String, OperationError> {
        self.objects
            .lock()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| OperationError::Probe(format!("no object at '{key}'")))
    }
}

#[async_trait]
impl ResourceOperation for ObjectWrite {
    fn name(&self) -> &str {
        "write-object"
    }

    async fn execute(&self, ctx: &RequestContext) -> Result<OperationResult, OperationError> {
        let key = format!("{}.txt", ctx.request_id);
        let body = "test";

        if let Err(err) = self.probe(&key).await {
            tracing::debug!(key = %key, error = %err, "object probe missed, proceeding to write");
        }

        self.objects
            .lock()
            .await
            .insert(key.clone(), body.to_string());

        Ok(OperationResult::new()
            .with_annotation("bucket", &self.bucket)
            .with_annotation("key", &key)
            .with_metadata(serde_json::json!({ "body": body })))
    }
}

/// Reads a record, then writes it back, strictly in that order.
pub struct RecordReadWrite {
    table: String,
    records: Arc<Mutex<HashMap<String, String>>>,
}

impl RecordReadWrite {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            records: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn record(&self, id: &str) -> Option<String> {
        self.records.lock().await.get(id).cloned()
    }
}

#[async_trait]
impl ResourceOperation for RecordReadWrite {
    fn name(&self) -> &str {
        "record-read-write"
    }

    async fn execute(&self, ctx: &RequestContext) -> Result<OperationResult, OperationError> {
        let id = ctx.request_id.clone();
        let value = "test";

        // Read strictly before write; an absent record is not an error.
        let existing = self.records.lock().await.get(&id).cloned();
        tracing::debug!(table = %self.table, id = %id, found = existing.is_some(), "record read");

        self.records
            .lock()
            .await
            .insert(id.clone(), value.to_string());

        Ok(OperationResult::new()
            .with_annotation("table", &self.table)
            .with_annotation("id", &id)
            .with_metadata(serde_json::json!({ "value": value })))
    }
}

/// Simulated request/response invocation of a named function.
pub struct FunctionInvoke {
    function: String,
}

impl FunctionInvoke {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
        }
    }
}

#[async_trait]
impl ResourceOperation for FunctionInvoke {
    fn name(&self) -> &str {
        "invoke-function"
    }

    async fn execute(&self, _ctx: &RequestContext) -> Result<OperationResult, OperationError> {
        tracing::info!(function = %self.function, "invoking function");
        let response_body = "foo";

        Ok(OperationResult::new()
            .with_annotation("function", &self.function)
            .with_metadata(serde_json::json!({ "response_body": response_body })))
    }
}

/// The standard fan-out set for one deployment stage.
pub fn standard_operations(stage: &str) -> Vec<Arc<dyn ResourceOperation>> {
    vec![
        Arc::new(TopicPublish::new(format!("notifications-{stage}"))),
        Arc::new(ObjectWrite::new(format!("objects-{stage}"))),
        Arc::new(RecordReadWrite::new(format!("records-{stage}"))),
        Arc::new(FunctionInvoke::new(format!("worker-{stage}"))),
    ]
}
