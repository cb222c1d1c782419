//! Citegraph Graph Library
//!
//! Paper metadata normalization and citation graph exploration:
//! - Validated paper records with influence and arXiv filtering
//! - Top-k neighbor selection and materialization
//! - Lazily expandable graph nodes with a bounded hop budget

pub mod node;
pub mod paper;
pub mod selection;

#[cfg(test)]
mod test_support;

pub use node::{ChildSummary, ExpansionBudget, GraphNode};
pub use paper::{Author, Axis, Neighbor, PaperRecord, PaperSource, Topic};
pub use selection::NeighborInfo;
