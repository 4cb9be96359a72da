//! Shared error type across tiny-service crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input or malformed configuration.
    BadRequest,
    /// No route for the requested path.
    NotFound,
    /// Metric registration or recording misuse.
    MetricsMisuse,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::MetricsMisuse => "METRICS_MISUSE",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, TinyError>;

/// Unified error type used by core and service.
#[derive(Debug, Error)]
pub enum TinyError {
    #[error("duplicate metric name: {0}")]
    DuplicateMetricName(String),
    #[error("invalid metric name: {0}")]
    InvalidMetricName(String),
    #[error("label mismatch on {metric}: expected {expected} values, got {got}")]
    LabelMismatch {
        metric: String,
        expected: usize,
        got: usize,
    },
    #[error("invalid buckets for {0}: bounds must be finite and strictly increasing")]
    InvalidBuckets(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl TinyError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            TinyError::DuplicateMetricName(_)
            | TinyError::InvalidMetricName(_)
            | TinyError::LabelMismatch { .. }
            | TinyError::InvalidBuckets(_) => ClientCode::MetricsMisuse,
            TinyError::NotFound(_) => ClientCode::NotFound,
            TinyError::Config(_) => ClientCode::BadRequest,
            TinyError::Internal(_) => ClientCode::Internal,
        }
    }
}
