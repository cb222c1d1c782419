//! Validated paper records
//!
//! Turns a loosely structured provider payload into a [`PaperRecord`]:
//! required keys are checked up front, citation and reference lists are
//! reduced to influential arXiv-resolvable entries, and the neighbor counts
//! are derived from what survives.

mod filter;

pub use filter::{arxiv_resolvable_only, influential_only, NeighborEntry};

use citegraph_common::errors::{AppError, Diagnostic, Result};
use citegraph_common::fetcher::{value_kind, MetadataFetcher, RawPayload};
use citegraph_common::metrics;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Keys every raw payload must carry before normalization
pub const REQUIRED_KEYS: [&str; 14] = [
    "abstract",
    "arxivId",
    "authors",
    "citations",
    "doi",
    "fieldsOfStudy",
    "influentialCitationCount",
    "paperId",
    "references",
    "title",
    "topics",
    "url",
    "venue",
    "year",
];

/// Upstream counts are never trusted; these are always recomputed
const DERIVED_KEYS: [&str; 2] = ["numCitations", "numReferences"];

/// Where a record comes from
#[derive(Debug, Clone, PartialEq)]
pub enum PaperSource {
    /// arXiv identifier to fetch from the provider
    Identifier(String),
    /// Payload already in memory
    RawPayload(RawPayload),
}

impl From<RawPayload> for PaperSource {
    fn from(payload: RawPayload) -> Self {
        PaperSource::RawPayload(payload)
    }
}

impl From<&str> for PaperSource {
    fn from(arxiv_id: &str) -> Self {
        PaperSource::Identifier(arxiv_id.to_string())
    }
}

impl From<String> for PaperSource {
    fn from(arxiv_id: String) -> Self {
        PaperSource::Identifier(arxiv_id)
    }
}

impl TryFrom<Value> for PaperSource {
    type Error = AppError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(arxiv_id) => Ok(PaperSource::Identifier(arxiv_id)),
            Value::Object(payload) => Ok(PaperSource::RawPayload(payload)),
            other => Err(AppError::InvalidSourceType {
                found: value_kind(&other).to_string(),
            }),
        }
    }
}

/// Which neighbor collection an operation works on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Papers citing this one
    Citations,
    /// Papers this one cites
    References,
}

impl Axis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::Citations => "citations",
            Axis::References => "references",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub name: String,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub topic: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Citation or reference entry as listed on a paper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Neighbor {
    pub arxiv_id: Option<String>,

    #[serde(default)]
    pub authors: Vec<Author>,

    #[serde(default)]
    pub title: Option<String>,

    pub is_influential: bool,

    #[serde(default)]
    pub paper_id: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub venue: Option<String>,

    #[serde(default)]
    pub year: Option<i32>,

    #[serde(default)]
    pub doi: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Vec<String>>,

    /// Provider keys without a typed counterpart
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Neighbor {
    /// arXiv identifier usable for a follow-up fetch
    pub fn resolvable_arxiv_id(&self) -> Option<&str> {
        self.arxiv_id
            .as_deref()
            .map(str::trim)
            .filter(|arxiv_id| !arxiv_id.is_empty())
    }
}

/// Normalized paper metadata
///
/// Immutable once built. `citations` and `references` only hold influential
/// entries with an arXiv identifier, and `numCitations`/`numReferences`
/// always equal their lengths.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperRecord {
    paper_id: String,
    arxiv_id: Option<String>,
    title: String,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    authors: Vec<Author>,
    url: String,
    venue: String,
    year: Option<i32>,
    doi: Option<String>,
    fields_of_study: Option<BTreeSet<String>>,
    topics: Vec<Topic>,
    influential_citation_count: u64,
    citations: Vec<Neighbor>,
    references: Vec<Neighbor>,
    num_citations: usize,
    num_references: usize,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl PaperRecord {
    /// Build a record from an identifier or an in-memory payload
    pub async fn construct(
        source: impl Into<PaperSource>,
        fetcher: &dyn MetadataFetcher,
    ) -> Result<Self> {
        let payload = match source.into() {
            PaperSource::RawPayload(payload) => payload,
            PaperSource::Identifier(arxiv_id) => {
                tracing::warn!(
                    diagnostic = Diagnostic::MissingInCache.as_str(),
                    arxiv_id = %arxiv_id,
                    fetcher = fetcher.name(),
                    "Paper not present in memory, extracting metadata upstream"
                );
                metrics::record_diagnostic(Diagnostic::MissingInCache);
                fetcher.fetch(&arxiv_id).await?
            }
        };

        Self::from_payload(payload)
    }

    /// Validate and normalize a payload without touching the network
    pub fn from_payload(mut payload: RawPayload) -> Result<Self> {
        check_required_keys(&payload)?;

        for key in DERIVED_KEYS {
            payload.remove(key);
        }

        let citations = normalize_neighbors(Axis::Citations, take(&mut payload, "citations")?)?;
        let references = normalize_neighbors(Axis::References, take(&mut payload, "references")?)?;

        let record = Self {
            paper_id: take(&mut payload, "paperId")?,
            arxiv_id: take(&mut payload, "arxivId")?,
            title: take(&mut payload, "title")?,
            abstract_text: take(&mut payload, "abstract")?,
            authors: take(&mut payload, "authors")?,
            url: take(&mut payload, "url")?,
            venue: take(&mut payload, "venue")?,
            year: take(&mut payload, "year")?,
            doi: take(&mut payload, "doi")?,
            fields_of_study: take(&mut payload, "fieldsOfStudy")?,
            topics: take(&mut payload, "topics")?,
            influential_citation_count: take(&mut payload, "influentialCitationCount")?,
            num_citations: citations.len(),
            num_references: references.len(),
            citations,
            references,
            extra: payload,
        };

        tracing::debug!(
            paper_id = %record.paper_id,
            num_citations = record.num_citations,
            num_references = record.num_references,
            "Paper record normalized"
        );

        Ok(record)
    }

    /// Keyed lookup over the normalized record
    pub fn get(&self, key: &str) -> Result<Value> {
        let missing = || AppError::FieldAccess {
            key: key.to_string(),
        };

        let value = match key {
            "paperId" => serde_json::to_value(&self.paper_id)?,
            "arxivId" => serde_json::to_value(&self.arxiv_id)?,
            "title" => serde_json::to_value(&self.title)?,
            "abstract" => serde_json::to_value(&self.abstract_text)?,
            "authors" => serde_json::to_value(&self.authors)?,
            "url" => serde_json::to_value(&self.url)?,
            "venue" => serde_json::to_value(&self.venue)?,
            "year" => serde_json::to_value(self.year)?,
            "doi" => serde_json::to_value(&self.doi)?,
            "fieldsOfStudy" => serde_json::to_value(&self.fields_of_study)?,
            "topics" => serde_json::to_value(&self.topics)?,
            "influentialCitationCount" => Value::from(self.influential_citation_count),
            "citations" => serde_json::to_value(&self.citations)?,
            "references" => serde_json::to_value(&self.references)?,
            "numCitations" => Value::from(self.num_citations),
            "numReferences" => Value::from(self.num_references),
            _ => return self.extra.get(key).cloned().ok_or_else(missing),
        };

        Ok(value)
    }

    pub fn paper_id(&self) -> &str {
        &self.paper_id
    }

    pub fn arxiv_id(&self) -> Option<&str> {
        self.arxiv_id.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn abstract_text(&self) -> Option<&str> {
        self.abstract_text.as_deref()
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn venue(&self) -> &str {
        &self.venue
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn doi(&self) -> Option<&str> {
        self.doi.as_deref()
    }

    pub fn fields_of_study(&self) -> Option<&BTreeSet<String>> {
        self.fields_of_study.as_ref()
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn influential_citation_count(&self) -> u64 {
        self.influential_citation_count
    }

    pub fn citations(&self) -> &[Neighbor] {
        &self.citations
    }

    pub fn references(&self) -> &[Neighbor] {
        &self.references
    }

    pub fn num_citations(&self) -> usize {
        self.num_citations
    }

    pub fn num_references(&self) -> usize {
        self.num_references
    }

    /// Neighbor collection for an axis
    pub fn neighbors(&self, axis: Axis) -> &[Neighbor] {
        match axis {
            Axis::Citations => &self.citations,
            Axis::References => &self.references,
        }
    }

    /// Derived neighbor count for an axis
    pub fn neighbor_count(&self, axis: Axis) -> usize {
        match axis {
            Axis::Citations => self.num_citations,
            Axis::References => self.num_references,
        }
    }
}

/// Reject payloads lacking any required key, naming all of them
fn check_required_keys(payload: &RawPayload) -> Result<()> {
    let missing: Vec<String> = REQUIRED_KEYS
        .iter()
        .filter(|key| !payload.contains_key(**key))
        .map(|key| key.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::MissingFields { fields: missing })
    }
}

fn take<T: DeserializeOwned>(payload: &mut RawPayload, key: &str) -> Result<T> {
    let value = payload.remove(key).unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|e| AppError::MalformedField {
        field: key.to_string(),
        message: e.to_string(),
    })
}

/// Influence filter first, then the arXiv filter, both on the raw entries.
///
/// Only surviving entries are decoded, so a dropped entry never fails the paper.
fn normalize_neighbors(axis: Axis, entries: Vec<Value>) -> Result<Vec<Neighbor>> {
    let listed = entries.len();

    let influential = influential_only(entries);
    let not_influential = listed - influential.len();
    metrics::record_dropped(axis.as_str(), "influence", not_influential);

    let kept = arxiv_resolvable_only(influential);
    let unresolvable = listed - not_influential - kept.len();
    metrics::record_dropped(axis.as_str(), "arxiv_id", unresolvable);

    tracing::debug!(
        axis = axis.as_str(),
        listed,
        not_influential,
        unresolvable,
        kept = kept.len(),
        "Neighbors filtered"
    );

    kept.into_iter()
        .map(|entry| {
            serde_json::from_value(entry).map_err(|e| AppError::MalformedField {
                field: axis.as_str().to_string(),
                message: e.to_string(),
            })
        })
        .collect()
}
