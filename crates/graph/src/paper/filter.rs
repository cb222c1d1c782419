//! Neighbor filters
//!
//! Both filters preserve order and are idempotent, so applying them in
//! either order yields the same collection. They run on raw provider
//! entries during normalization and on decoded [`Neighbor`]s alike.

use super::Neighbor;
use serde_json::Value;

/// What the filters need to know about a citation or reference entry
pub trait NeighborEntry {
    fn is_influential(&self) -> bool;

    /// Trimmed, non-blank arXiv identifier
    fn resolvable_arxiv_id(&self) -> Option<&str>;
}

impl NeighborEntry for Neighbor {
    fn is_influential(&self) -> bool {
        self.is_influential
    }

    fn resolvable_arxiv_id(&self) -> Option<&str> {
        Neighbor::resolvable_arxiv_id(self)
    }
}

/// Raw entry; anything but `"isInfluential": true` counts as not influential
impl NeighborEntry for Value {
    fn is_influential(&self) -> bool {
        self.get("isInfluential").and_then(Value::as_bool) == Some(true)
    }

    fn resolvable_arxiv_id(&self) -> Option<&str> {
        self.get("arxivId")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|arxiv_id| !arxiv_id.is_empty())
    }
}

/// Keep entries the provider flags as influential
pub fn influential_only<E: NeighborEntry>(entries: Vec<E>) -> Vec<E> {
    entries.into_iter().filter(|entry| entry.is_influential()).collect()
}

/// Keep entries that can be fetched again by arXiv identifier
pub fn arxiv_resolvable_only<E: NeighborEntry>(entries: Vec<E>) -> Vec<E> {
    entries
        .into_iter()
        .filter(|entry| entry.resolvable_arxiv_id().is_some())
        .collect()
}
