//! Top-k neighbor selection
//!
//! Picks the first `k` citations or references of a record, in listing
//! order, and either projects them to [`NeighborInfo`] or materializes each
//! one as a full [`PaperRecord`] by fetching it again.

use crate::paper::{Author, Axis, Neighbor, PaperRecord, PaperSource};
use citegraph_common::errors::{Diagnostic, Result};
use citegraph_common::fetcher::MetadataFetcher;
use citegraph_common::{metrics, NeighborFailurePolicy};
use serde::{Deserialize, Serialize};

/// Projected neighbor summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeighborInfo {
    pub arxiv_id: String,
    pub authors: Vec<Author>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub venue: Option<String>,
    pub year: Option<i32>,
}

impl NeighborInfo {
    /// `None` for entries without a resolvable arXiv identifier
    pub fn project(neighbor: &Neighbor) -> Option<Self> {
        let arxiv_id = neighbor.resolvable_arxiv_id()?;

        Some(Self {
            arxiv_id: arxiv_id.to_string(),
            authors: neighbor.authors.clone(),
            title: neighbor.title.clone(),
            url: neighbor.url.clone(),
            venue: neighbor.venue.clone(),
            year: neighbor.year,
        })
    }
}

impl PaperRecord {
    pub fn top_k_citations(&self, k: usize) -> Vec<NeighborInfo> {
        self.top_k(Axis::Citations, k)
    }

    pub fn top_k_references(&self, k: usize) -> Vec<NeighborInfo> {
        self.top_k(Axis::References, k)
    }

    /// First `k` entries of an axis, clamped to what the record holds
    pub fn top_k(&self, axis: Axis, k: usize) -> Vec<NeighborInfo> {
        let k = clamp_k(axis, k, self.neighbor_count(axis));

        self.neighbors(axis)[..k]
            .iter()
            .filter_map(NeighborInfo::project)
            .collect()
    }

    pub async fn top_k_citation_records(
        &self,
        k: usize,
        fetcher: &dyn MetadataFetcher,
    ) -> Result<Vec<PaperRecord>> {
        self.top_k_records(Axis::Citations, k, fetcher, NeighborFailurePolicy::Abort)
            .await
    }

    pub async fn top_k_reference_records(
        &self,
        k: usize,
        fetcher: &dyn MetadataFetcher,
    ) -> Result<Vec<PaperRecord>> {
        self.top_k_records(Axis::References, k, fetcher, NeighborFailurePolicy::Abort)
            .await
    }

    pub async fn top_k_citation_records_with_policy(
        &self,
        k: usize,
        fetcher: &dyn MetadataFetcher,
        policy: NeighborFailurePolicy,
    ) -> Result<Vec<PaperRecord>> {
        self.top_k_records(Axis::Citations, k, fetcher, policy).await
    }

    pub async fn top_k_reference_records_with_policy(
        &self,
        k: usize,
        fetcher: &dyn MetadataFetcher,
        policy: NeighborFailurePolicy,
    ) -> Result<Vec<PaperRecord>> {
        self.top_k_records(Axis::References, k, fetcher, policy).await
    }

    /// Fetch and validate each selected neighbor, one after another
    pub async fn top_k_records(
        &self,
        axis: Axis,
        k: usize,
        fetcher: &dyn MetadataFetcher,
        policy: NeighborFailurePolicy,
    ) -> Result<Vec<PaperRecord>> {
        let selected = self.top_k(axis, k);
        let mut records = Vec::with_capacity(selected.len());

        for neighbor in selected {
            let source = PaperSource::Identifier(neighbor.arxiv_id.clone());

            match PaperRecord::construct(source, fetcher).await {
                Ok(record) => records.push(record),
                Err(e) if policy == NeighborFailurePolicy::SkipAndWarn => {
                    tracing::warn!(
                        diagnostic = Diagnostic::NeighborSkipped.as_str(),
                        axis = axis.as_str(),
                        arxiv_id = %neighbor.arxiv_id,
                        error = %e,
                        "Skipping neighbor that failed to materialize"
                    );
                    metrics::record_diagnostic(Diagnostic::NeighborSkipped);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(records)
    }
}

fn clamp_k(axis: Axis, requested: usize, available: usize) -> usize {
    if requested <= available {
        return requested;
    }

    tracing::warn!(
        diagnostic = Diagnostic::KClamped.as_str(),
        axis = axis.as_str(),
        requested,
        available,
        "Total {} are {}, retrieving all of them",
        axis.as_str(),
        available
    );
    metrics::record_diagnostic(Diagnostic::KClamped);

    available
}
