//! Lazily expandable citation graph node
//!
//! A [`GraphNode`] owns one [`PaperRecord`] and expands a single hop of
//! citations or references on request. Going further is up to the caller,
//! bounded by the node's [`ExpansionBudget`].

use crate::paper::{Axis, PaperRecord, PaperSource};
use crate::selection::NeighborInfo;
use citegraph_common::errors::Result;
use citegraph_common::fetcher::MetadataFetcher;
use citegraph_common::{GraphConfig, NeighborFailurePolicy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Fan-out per axis plus the number of hops left
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionBudget {
    pub citations: usize,
    pub references: usize,
    pub depth: usize,
}

impl Default for ExpansionBudget {
    fn default() -> Self {
        Self {
            citations: 1,
            references: 1,
            depth: 1,
        }
    }
}

impl From<&GraphConfig> for ExpansionBudget {
    fn from(config: &GraphConfig) -> Self {
        Self {
            citations: config.citation_fan_out,
            references: config.reference_fan_out,
            depth: config.depth,
        }
    }
}

impl ExpansionBudget {
    fn fan_out(&self, axis: Axis) -> usize {
        match axis {
            Axis::Citations => self.citations,
            Axis::References => self.references,
        }
    }
}

/// Lightweight view of a materialized child
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildSummary {
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub arxiv_id: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_citations: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_references: Option<usize>,
}

impl ChildSummary {
    /// Project a child record, keeping the count for the axis it was reached by
    pub fn project(record: &PaperRecord, axis: Axis) -> Self {
        let (num_citations, num_references) = match axis {
            Axis::Citations => (Some(record.num_citations()), None),
            Axis::References => (None, Some(record.num_references())),
        };

        Self {
            abstract_text: record.abstract_text().map(str::to_string),
            arxiv_id: record.arxiv_id().map(str::to_string),
            title: record.title().to_string(),
            num_citations,
            num_references,
        }
    }
}

pub struct GraphNode {
    record: PaperRecord,
    budget: ExpansionBudget,
    policy: NeighborFailurePolicy,
    fetcher: Arc<dyn MetadataFetcher>,
    citation_children: Option<Vec<NeighborInfo>>,
    reference_children: Option<Vec<NeighborInfo>>,
}

impl GraphNode {
    /// Wrap a record with the default budget of one neighbor per axis
    pub fn new(record: PaperRecord, fetcher: Arc<dyn MetadataFetcher>) -> Self {
        Self {
            record,
            budget: ExpansionBudget::default(),
            policy: NeighborFailurePolicy::default(),
            fetcher,
            citation_children: None,
            reference_children: None,
        }
    }

    /// Wrap a record using fan-out, depth and failure policy from configuration
    pub fn from_config(
        record: PaperRecord,
        fetcher: Arc<dyn MetadataFetcher>,
        config: &GraphConfig,
    ) -> Self {
        Self::new(record, fetcher)
            .with_budget(ExpansionBudget::from(config))
            .with_policy(config.neighbor_failure_policy)
    }

    /// Build the record first, then wrap it
    pub async fn from_source(
        source: impl Into<PaperSource>,
        fetcher: Arc<dyn MetadataFetcher>,
    ) -> Result<Self> {
        let record = PaperRecord::construct(source, fetcher.as_ref()).await?;
        Ok(Self::new(record, fetcher))
    }

    pub fn with_budget(mut self, budget: ExpansionBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_policy(mut self, policy: NeighborFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn record(&self) -> &PaperRecord {
        &self.record
    }

    pub fn into_record(self) -> PaperRecord {
        self.record
    }

    pub fn budget(&self) -> ExpansionBudget {
        self.budget
    }

    pub fn is_citation_leaf(&self) -> bool {
        self.is_leaf(Axis::Citations)
    }

    pub fn is_reference_leaf(&self) -> bool {
        self.is_leaf(Axis::References)
    }

    pub fn is_leaf(&self, axis: Axis) -> bool {
        self.record.neighbor_count(axis) == 0
    }

    /// Populate `citation_children`; no-op on a leaf or when already expanded
    pub fn expand_citations(&mut self) {
        self.expand(Axis::Citations);
    }

    /// Populate `reference_children`; no-op on a leaf or when already expanded
    pub fn expand_references(&mut self) {
        self.expand(Axis::References);
    }

    /// `None` until the citation axis has been expanded
    pub fn citation_children(&self) -> Option<&[NeighborInfo]> {
        self.citation_children.as_deref()
    }

    /// `None` until the reference axis has been expanded
    pub fn reference_children(&self) -> Option<&[NeighborInfo]> {
        self.reference_children.as_deref()
    }

    pub async fn citation_children_metadata(&self) -> Result<Vec<ChildSummary>> {
        self.children_metadata(Axis::Citations).await
    }

    pub async fn reference_children_metadata(&self) -> Result<Vec<ChildSummary>> {
        self.children_metadata(Axis::References).await
    }

    /// Materialized citation children, each wrapped one hop further down
    pub async fn citation_child_nodes(&self) -> Result<Vec<GraphNode>> {
        self.child_nodes(Axis::Citations).await
    }

    /// Materialized reference children, each wrapped one hop further down
    pub async fn reference_child_nodes(&self) -> Result<Vec<GraphNode>> {
        self.child_nodes(Axis::References).await
    }

    fn expand(&mut self, axis: Axis) {
        if self.is_leaf(axis) {
            return;
        }

        let fan_out = self.budget.fan_out(axis);
        let children = match axis {
            Axis::Citations => &mut self.citation_children,
            Axis::References => &mut self.reference_children,
        };
        if children.is_some() {
            return;
        }

        *children = Some(self.record.top_k(axis, fan_out));
    }

    async fn materialize(&self, axis: Axis) -> Result<Vec<PaperRecord>> {
        if self.is_leaf(axis) {
            return Ok(Vec::new());
        }

        self.record
            .top_k_records(axis, self.budget.fan_out(axis), self.fetcher.as_ref(), self.policy)
            .await
    }

    async fn children_metadata(&self, axis: Axis) -> Result<Vec<ChildSummary>> {
        let records = self.materialize(axis).await?;

        Ok(records
            .iter()
            .map(|record| ChildSummary::project(record, axis))
            .collect())
    }

    async fn child_nodes(&self, axis: Axis) -> Result<Vec<GraphNode>> {
        if self.budget.depth == 0 {
            tracing::debug!(
                paper_id = %self.record.paper_id(),
                axis = axis.as_str(),
                "Expansion depth exhausted"
            );
            return Ok(Vec::new());
        }

        let budget = ExpansionBudget {
            depth: self.budget.depth - 1,
            ..self.budget
        };

        let records = self.materialize(axis).await?;
        Ok(records
            .into_iter()
            .map(|record| {
                GraphNode::new(record, Arc::clone(&self.fetcher))
                    .with_budget(budget)
                    .with_policy(self.policy)
            })
            .collect())
    }
}

impl fmt::Debug for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphNode")
            .field("paper_id", &self.record.paper_id())
            .field("budget", &self.budget)
            .field("policy", &self.policy)
            .field("fetcher", &self.fetcher.name())
            .field("citation_children", &self.citation_children)
            .field("reference_children", &self.reference_children)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{capture_diagnostics, neighbor, paper_json, payload};
    use citegraph_common::StaticFetcher;
    use serde_json::json;

    fn root_payload() -> serde_json::Map<String, serde_json::Value> {
        payload(paper_json(
            "1706.03762",
            vec![
                neighbor(Some("1810.04805"), true),
                neighbor(Some("1409.0473"), false),
                neighbor(Some("1512.03385"), true),
            ],
            vec![neighbor(Some("1301.3781"), true)],
        ))
    }

    fn fetcher() -> Arc<StaticFetcher> {
        Arc::new(
            StaticFetcher::new()
                .with_payload(
                    "1810.04805",
                    payload(paper_json(
                        "1810.04805",
                        vec![neighbor(Some("1907.11692"), true)],
                        vec![],
                    )),
                )
                .with_payload("1512.03385", payload(paper_json("1512.03385", vec![], vec![])))
                .with_payload(
                    "1301.3781",
                    payload(paper_json(
                        "1301.3781",
                        vec![],
                        vec![neighbor(Some("1310.4546"), true), neighbor(Some("1405.4053"), true)],
                    )),
                ),
        )
    }

    fn node(fetcher: Arc<StaticFetcher>) -> GraphNode {
        GraphNode::new(PaperRecord::from_payload(root_payload()).unwrap(), fetcher)
    }

    #[test]
    fn test_leaf_expansion_is_noop() {
        let record = PaperRecord::from_payload(payload(paper_json(
            "1512.03385",
            vec![neighbor(Some("1810.04805"), false), neighbor(None, true)],
            vec![],
        )))
        .unwrap();
        let mut node = GraphNode::new(record, fetcher());

        assert_eq!(node.record().num_citations(), 0);
        assert!(node.is_citation_leaf());
        node.expand_citations();
        node.expand_references();

        assert!(node.citation_children().is_none());
        assert!(node.reference_children().is_none());
    }

    #[test]
    fn test_children_absent_until_expanded() {
        let mut node = node(fetcher());
        assert!(node.citation_children().is_none());

        node.expand_citations();

        let children = node.citation_children().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].arxiv_id, "1810.04805");
        assert!(node.reference_children().is_none());
    }

    #[test]
    fn test_expansion_is_idempotent() {
        let (_guard, diagnostics) = capture_diagnostics();
        let mut node = node(fetcher()).with_budget(ExpansionBudget {
            citations: 10,
            references: 1,
            depth: 1,
        });

        node.expand_citations();
        let first = node.citation_children().map(<[NeighborInfo]>::to_vec);
        node.expand_citations();

        assert_eq!(node.citation_children().map(<[NeighborInfo]>::to_vec), first);
        assert_eq!(first.unwrap().len(), 2);
        // Fan-out is clamped once, on the first expansion
        assert_eq!(*diagnostics.lock().unwrap(), vec!["k_clamped".to_string()]);
    }

    #[tokio::test]
    async fn test_children_metadata_projection() {
        let fetcher = fetcher();
        let node = node(fetcher.clone()).with_budget(ExpansionBudget {
            citations: 2,
            references: 1,
            depth: 1,
        });

        let citations = node.citation_children_metadata().await.unwrap();
        let references = node.reference_children_metadata().await.unwrap();

        assert_eq!(citations.len(), 2);
        assert_eq!(
            serde_json::to_value(&citations[0]).unwrap(),
            json!({
                "abstract": "Abstract of 1810.04805",
                "arxivId": "1810.04805",
                "title": "Paper 1810.04805",
                "numCitations": 1
            })
        );
        assert_eq!(
            serde_json::to_value(&references[0]).unwrap(),
            json!({
                "abstract": "Abstract of 1301.3781",
                "arxivId": "1301.3781",
                "title": "Paper 1301.3781",
                "numReferences": 2
            })
        );
        assert_eq!(
            fetcher.requests(),
            vec!["1810.04805".to_string(), "1512.03385".to_string(), "1301.3781".to_string()]
        );
    }

    #[tokio::test]
    async fn test_leaf_metadata_does_not_fetch() {
        let (_guard, diagnostics) = capture_diagnostics();
        let fetcher = fetcher();
        let record = PaperRecord::from_payload(payload(paper_json("1512.03385", vec![], vec![]))).unwrap();
        let node = GraphNode::new(record, fetcher.clone());

        assert!(node.citation_children_metadata().await.unwrap().is_empty());
        assert!(fetcher.requests().is_empty());
        assert!(diagnostics.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_child_nodes_spend_depth() {
        let fetcher = fetcher();
        let root = node(fetcher.clone());

        let children = root.citation_child_nodes().await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].record().arxiv_id(), Some("1810.04805"));
        assert_eq!(children[0].budget().depth, 0);

        // The child still expands its own hop but cannot go deeper
        let mut child = children.into_iter().next().unwrap();
        child.expand_citations();
        assert_eq!(child.citation_children().unwrap()[0].arxiv_id, "1907.11692");
        assert!(child.citation_child_nodes().await.unwrap().is_empty());
        assert_eq!(fetcher.requests(), vec!["1810.04805".to_string()]);
    }

    #[tokio::test]
    async fn test_from_config_and_source() {
        let fetcher = fetcher();
        let config = GraphConfig {
            citation_fan_out: 3,
            reference_fan_out: 0,
            depth: 2,
            neighbor_failure_policy: NeighborFailurePolicy::SkipAndWarn,
        };

        let root = GraphNode::from_source("1810.04805", fetcher.clone()).await.unwrap();
        let node = GraphNode::from_config(root.into_record(), fetcher, &config);

        assert_eq!(
            node.budget(),
            ExpansionBudget {
                citations: 3,
                references: 0,
                depth: 2
            }
        );
        assert_eq!(node.record().num_citations(), 1);
    }
}
