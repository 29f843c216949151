//! Error types for the trace core

use thiserror::Error;

/// Result type alias using TraceError
pub type Result<T> = std::result::Result<T, TraceError>;

/// Errors that can occur in the trace core
///
/// Ledger mutation errors abort the call with no state change. Verification
/// outcomes are not errors; `verify_bundle` always returns a structured
/// report.
#[derive(Error, Debug)]
pub enum TraceError {
    /// Referenced span does not exist in this run
    #[error("Unknown span: {0}")]
    UnknownSpan(String),

    /// Target span is no longer accepting events
    #[error("Span is not running: {0}")]
    SpanClosed(String),

    /// Parent span id does not resolve within the run
    #[error("Invalid parent span: {0}")]
    InvalidParent(String),

    /// Mutation attempted after the run left the running state
    #[error("Run is finalized and can no longer be mutated")]
    AlreadyFinalized,

    /// Finalization attempted while the run is still running
    #[error("Run is still running; set a terminal status before finalizing")]
    InvalidRunStatus,

    /// Bundle bytes could not be decoded into a TraceBundle
    #[error("Malformed bundle: {0}")]
    MalformedBundle(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Signature provider failure (I/O, key material)
    #[error("Signature provider error: {0}")]
    SignatureError(String),
}

impl From<serde_json::Error> for TraceError {
    fn from(err: serde_json::Error) -> Self {
        TraceError::SerializationError(err.to_string())
    }
}
