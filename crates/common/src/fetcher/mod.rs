//! Metadata fetcher abstraction
//!
//! The boundary to the upstream paper metadata provider:
//! - Semantic Scholar (fetch by arXiv identifier)
//! - Static in-memory payloads for tests and offline exploration

use crate::config::FetcherConfig;
use crate::errors::FetchError;
use crate::metrics;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Loosely structured paper payload as returned by the provider
pub type RawPayload = Map<String, Value>;

/// Trait for fetching raw paper metadata
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Fetch the raw payload for an arXiv identifier
    async fn fetch(&self, arxiv_id: &str) -> Result<RawPayload, FetchError>;

    /// Get the fetcher name
    fn name(&self) -> &str;
}

/// Semantic Scholar v1 paper endpoint client
pub struct SemanticScholarFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl SemanticScholarFetcher {
    /// Create a new fetcher from configuration
    pub fn new(config: &FetcherConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Client {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Full request URL for an identifier
    pub fn paper_url(&self, arxiv_id: &str) -> String {
        format!("{}{}", self.base_url, arxiv_id)
    }

    async fn request(&self, arxiv_id: &str) -> Result<RawPayload, FetchError> {
        let response = self.client.get(self.paper_url(arxiv_id)).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        classify_response(arxiv_id, status, &body)
    }
}

/// Map an upstream status and body to a payload or a fetch error
fn classify_response(
    arxiv_id: &str,
    status: reqwest::StatusCode,
    body: &[u8],
) -> Result<RawPayload, FetchError> {
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(FetchError::NotFound {
            arxiv_id: arxiv_id.to_string(),
        });
    }
    if !status.is_success() {
        return Err(FetchError::Status {
            arxiv_id: arxiv_id.to_string(),
            status: status.as_u16(),
        });
    }

    let body: Value = serde_json::from_slice(body).map_err(|e| FetchError::Parse {
        arxiv_id: arxiv_id.to_string(),
        message: e.to_string(),
    })?;

    match body {
        Value::Object(payload) => Ok(payload),
        other => Err(FetchError::Parse {
            arxiv_id: arxiv_id.to_string(),
            message: format!("expected a JSON object, got {}", value_kind(&other)),
        }),
    }
}

#[async_trait]
impl MetadataFetcher for SemanticScholarFetcher {
    async fn fetch(&self, arxiv_id: &str) -> Result<RawPayload, FetchError> {
        tracing::debug!(arxiv_id = %arxiv_id, url = %self.paper_url(arxiv_id), "Fetching paper metadata");

        let result = self.request(arxiv_id).await;
        metrics::record_fetch(self.name(), result.is_ok());

        if let Err(e) = &result {
            tracing::warn!(arxiv_id = %arxiv_id, error = %e, "Metadata fetch failed");
        }
        result
    }

    fn name(&self) -> &str {
        "semantic_scholar"
    }
}

/// In-memory fetcher serving pre-loaded payloads
///
/// Every requested identifier is recorded, in order, so callers can audit
/// which papers a traversal actually touched.
#[derive(Default)]
pub struct StaticFetcher {
    payloads: HashMap<String, RawPayload>,
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a payload under an identifier
    pub fn insert(&mut self, arxiv_id: impl Into<String>, payload: RawPayload) {
        self.payloads.insert(arxiv_id.into(), payload);
    }

    /// Builder-style variant of [`StaticFetcher::insert`]
    pub fn with_payload(mut self, arxiv_id: impl Into<String>, payload: RawPayload) -> Self {
        self.insert(arxiv_id, payload);
        self
    }

    /// Identifiers requested so far
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MetadataFetcher for StaticFetcher {
    async fn fetch(&self, arxiv_id: &str) -> Result<RawPayload, FetchError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(arxiv_id.to_string());
        }

        let result = self
            .payloads
            .get(arxiv_id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                arxiv_id: arxiv_id.to_string(),
            });
        metrics::record_fetch(self.name(), result.is_ok());
        result
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Short name of a JSON value's type, for error messages
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
