//! Configuration management for Citegraph
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{APP_ENV}.toml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Upstream metadata provider configuration
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Graph expansion configuration
    #[serde(default)]
    pub graph: GraphConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetcherConfig {
    /// Endpoint prefix; the arXiv identifier is appended verbatim
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// What to do when one neighbor of a multi-neighbor materialization fails
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NeighborFailurePolicy {
    /// Propagate the first failure and discard the batch
    #[default]
    Abort,
    /// Drop the failed neighbor, emit a diagnostic and continue
    SkipAndWarn,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphConfig {
    /// Citations expanded per hop
    #[serde(default = "default_fan_out")]
    pub citation_fan_out: usize,

    /// References expanded per hop
    #[serde(default = "default_fan_out")]
    pub reference_fan_out: usize,

    /// Hops a caller may take from the root node
    #[serde(default = "default_depth")]
    pub depth: usize,

    #[serde(default)]
    pub neighbor_failure_policy: NeighborFailurePolicy,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Service name attached to log lines
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_base_url() -> String { "https://api.semanticscholar.org/v1/paper/arXiv:".to_string() }
fn default_fetch_timeout() -> u64 { 30 }
fn default_user_agent() -> String { format!("citegraph/{}", crate::VERSION) }
fn default_fan_out() -> usize { 1 }
fn default_depth() -> usize { 1 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_service_name() -> String { "citegraph".to_string() }

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_fetch_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            citation_fan_out: default_fan_out(),
            reference_fan_out: default_fan_out(),
            depth: default_depth(),
            neighbor_failure_policy: NeighborFailurePolicy::default(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            service_name: default_service_name(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__GRAPH__CITATION_FAN_OUT=3
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get fetch timeout as Duration
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetcher.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.graph.citation_fan_out, 1);
        assert_eq!(config.graph.reference_fan_out, 1);
        assert_eq!(config.graph.depth, 1);
        assert_eq!(config.graph.neighbor_failure_policy, NeighborFailurePolicy::Abort);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(30));
        assert!(config.fetcher.base_url.ends_with("arXiv:"));
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "graph": { "citation_fan_out": 4, "neighbor_failure_policy": "skip_and_warn" }
        }))
        .unwrap();

        assert_eq!(config.graph.citation_fan_out, 4);
        assert_eq!(config.graph.reference_fan_out, 1);
        assert_eq!(config.graph.neighbor_failure_policy, NeighborFailurePolicy::SkipAndWarn);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("citegraph-config-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "[fetcher]\nbase_url = \"http://localhost:8080/paper/\"\n\n[graph]\nreference_fan_out = 5\ndepth = 3\n",
        )
        .unwrap();

        let config = AppConfig::from_file(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.fetcher.base_url, "http://localhost:8080/paper/");
        assert_eq!(config.fetcher.timeout_secs, 30);
        assert_eq!(config.graph.reference_fan_out, 5);
        assert_eq!(config.graph.citation_fan_out, 1);
        assert_eq!(config.graph.depth, 3);
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err = AppConfig::from_file("/nonexistent/citegraph").unwrap_err();
        let err = crate::errors::AppError::from(err);
        assert_eq!(err.code(), crate::errors::ErrorCode::ConfigurationError);
    }
}
