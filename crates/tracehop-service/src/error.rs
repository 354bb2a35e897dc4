//! Error taxonomy for the entry service.

use thiserror::Error;
use tracehop_span::SpanError;

/// A resource operation failed.
///
/// Probe failures (read-before-write checks) are expected misses and are
/// absorbed inside the operation that issued them; write and backend
/// failures propagate and abort the orchestration.
#[derive(Error, Debug)]
pub enum OperationError {
    #[error("probe failed: {0}")]
    Probe(String),

    #[error("write failed: {0}")]
    Write(String),

    #[error("backend failure: {0}")]
    Backend(String),
}

/// Top-level error type for one request's orchestration.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// A resource operation's non-recoverable sub-step failed.
    #[error("operation '{operation}' failed: {message}")]
    Operation { operation: String, message: String },

    /// The downstream hop could not be reached. Never retried here;
    /// retry policy belongs to a higher layer.
    #[error("transport failure calling {url}: {message}")]
    Transport { url: String, message: String },

    /// The downstream reply body was not the expected shape.
    #[error("failed to decode downstream reply: {0}")]
    Decode(String),

    /// Deliberate fault used to validate timeout trace capture.
    #[error("timed out")]
    TimeoutFault,

    /// Deliberate fault used to validate failure trace capture.
    #[error("boom")]
    ExplicitFault,

    /// A span-contract violation surfaced past the log-and-continue
    /// handling at the call site.
    #[error(transparent)]
    Span(#[from] SpanError),
}

impl ServiceError {
    pub fn operation(name: &str, err: OperationError) -> Self {
        ServiceError::Operation {
            operation: name.to_string(),
            message: err.to_string(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::Operation { .. } => "OPERATION_FAILED",
            ServiceError::Transport { .. } => "TRANSPORT_ERROR",
            ServiceError::Decode(_) => "DECODE_ERROR",
            ServiceError::TimeoutFault => "TIMEOUT_FAULT",
            ServiceError::ExplicitFault => "EXPLICIT_FAULT",
            ServiceError::Span(_) => "SPAN_CONTRACT",
        }
    }
}

/// Result type alias for orchestration operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_messages_are_exact() {
        assert_eq!(ServiceError::TimeoutFault.to_string(), "timed out");
        assert_eq!(ServiceError::ExplicitFault.to_string(), "boom");
    }

    #[test]
    fn test_operation_error_carries_name() {
        let err = ServiceError::operation(
            "write-object",
            OperationError::Write("store unavailable".to_string()),
        );
        assert_eq!(err.error_code(), "OPERATION_FAILED");
        assert!(err.to_string().contains("write-object"));
        assert!(err.to_string().contains("store unavailable"));
    }

    #[test]
    fn test_span_error_converts() {
        let err: ServiceError = SpanError::UnknownSpan(uuid::Uuid::new_v4()).into();
        assert_eq!(err.error_code(), "SPAN_CONTRACT");
    }
}
