//! Citegraph Common Library
//!
//! Shared code for the Citegraph crates including:
//! - Error types and non-fatal diagnostics
//! - Configuration management
//! - The upstream metadata fetcher boundary
//! - Metrics and tracing setup

pub mod config;
pub mod errors;
pub mod fetcher;
pub mod metrics;
pub mod telemetry;

// Re-export commonly used types
pub use config::{AppConfig, GraphConfig, NeighborFailurePolicy};
pub use errors::{AppError, Diagnostic, ErrorCode, FetchError, Result};
pub use fetcher::{MetadataFetcher, RawPayload, SemanticScholarFetcher, StaticFetcher};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
