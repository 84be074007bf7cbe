//! Shared error type across promerge crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Merge attempted on a family type without an accumulation rule.
    UnsupportedMetricType,
    /// Merge invoked across differing family names (caller defect).
    NameMismatch,
    /// Invalid input / malformed exposition text.
    BadRequest,
    /// Unsupported configuration version.
    UnsupportedVersion,
    /// Payload too large.
    PayloadTooLarge,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::UnsupportedMetricType => "UNSUPPORTED_METRIC_TYPE",
            ClientCode::NameMismatch => "NAME_MISMATCH",
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MergeError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MergeError {
    #[error("unsupported metric type for {name}: {metric_type}")]
    UnsupportedMetricType { name: String, metric_type: String },
    #[error("family name mismatch: {existing} != {incoming}")]
    NameMismatch { existing: String, incoming: String },
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("internal: {0}")]
    Internal(String),
}

impl MergeError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            MergeError::UnsupportedMetricType { .. } => ClientCode::UnsupportedMetricType,
            MergeError::NameMismatch { .. } => ClientCode::NameMismatch,
            MergeError::BadRequest(_) => ClientCode::BadRequest,
            MergeError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            MergeError::PayloadTooLarge => ClientCode::PayloadTooLarge,
            MergeError::Internal(_) => ClientCode::Internal,
        }
    }
}
