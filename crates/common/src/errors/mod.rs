//! Error types for Citegraph
//!
//! Provides the error handling system shared by every crate:
//! - Distinct error types for construction, lookup and upstream failures
//! - Machine-readable error codes
//! - Non-fatal diagnostics emitted as structured warnings

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    InvalidSourceType,
    MissingField,
    MalformedField,

    // Lookup errors (4xxx)
    FieldNotFound,

    // Upstream errors (8xxx)
    UpstreamError,
    PaperNotFound,

    // Internal errors (9xxx)
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Validation (1xxx)
            ErrorCode::InvalidSourceType => 1001,
            ErrorCode::MissingField => 1002,
            ErrorCode::MalformedField => 1003,

            // Lookup (4xxx)
            ErrorCode::FieldNotFound => 4001,

            // Upstream (8xxx)
            ErrorCode::UpstreamError => 8001,
            ErrorCode::PaperNotFound => 8002,

            // Internal (9xxx)
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Failure reported by a metadata fetcher.
///
/// The core never retries or reinterprets these; they surface to the caller
/// wrapped in [`AppError::Fetch`].
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Paper not found upstream: arXiv:{arxiv_id}")]
    NotFound { arxiv_id: String },

    #[error("Upstream returned status {status} for arXiv:{arxiv_id}")]
    Status { arxiv_id: String, status: u16 },

    #[error("Failed to parse upstream payload for arXiv:{arxiv_id}: {message}")]
    Parse { arxiv_id: String, message: String },

    #[error("Failed to build HTTP client: {message}")]
    Client { message: String },
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Construction errors
    #[error("source must be a mapping or an arXiv identifier, got {found}")]
    InvalidSourceType { found: String },

    #[error("The following essential keys are missing from the paper: {}", .fields.join(", "))]
    MissingFields { fields: Vec<String> },

    #[error("Malformed field {field}: {message}")]
    MalformedField { field: String, message: String },

    // Lookup errors
    #[error("Key not present on paper record: {key}")]
    FieldAccess { key: String },

    // Upstream errors
    #[error(transparent)]
    Fetch(#[from] FetchError),

    // Internal errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::InvalidSourceType { .. } => ErrorCode::InvalidSourceType,
            AppError::MissingFields { .. } => ErrorCode::MissingField,
            AppError::MalformedField { .. } => ErrorCode::MalformedField,
            AppError::FieldAccess { .. } => ErrorCode::FieldNotFound,
            AppError::Fetch(FetchError::NotFound { .. }) => ErrorCode::PaperNotFound,
            AppError::Fetch(_) => ErrorCode::UpstreamError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
        }
    }

    /// Check if this error came from the metadata provider rather than the data
    pub fn is_upstream(&self) -> bool {
        matches!(self, AppError::Fetch(_))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}

/// Non-fatal conditions reported as warnings, never as errors
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Diagnostic {
    /// Record was fetched upstream instead of built from an in-memory payload
    MissingInCache,
    /// Requested neighbor count exceeded what the record holds
    KClamped,
    /// A neighbor failed to materialize and the skip policy absorbed it
    NeighborSkipped,
}

impl Diagnostic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Diagnostic::MissingInCache => "missing_in_cache",
            Diagnostic::KClamped => "k_clamped",
            Diagnostic::NeighborSkipped => "neighbor_skipped",
        }
    }
}
