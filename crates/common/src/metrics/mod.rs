//! Metrics and observability utilities
//!
//! Counters for upstream fetches, filtered neighbors and non-fatal
//! diagnostics. Without an installed recorder every helper is a no-op.

use crate::errors::Diagnostic;
use metrics::{counter, describe_counter, Unit};

/// Metrics prefix for all Citegraph metrics
pub const METRICS_PREFIX: &str = "citegraph";

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_fetch_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of upstream metadata fetches"
    );

    describe_counter!(
        format!("{}_neighbors_dropped_total", METRICS_PREFIX),
        Unit::Count,
        "Citation and reference entries removed during normalization"
    );

    describe_counter!(
        format!("{}_diagnostics_total", METRICS_PREFIX),
        Unit::Count,
        "Non-fatal diagnostics emitted"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record a metadata fetch
pub fn record_fetch(fetcher: &str, success: bool) {
    let outcome = if success { "success" } else { "error" };

    counter!(
        format!("{}_fetch_total", METRICS_PREFIX),
        "fetcher" => fetcher.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Helper to record neighbor entries removed by a filter
pub fn record_dropped(axis: &str, filter: &str, dropped: usize) {
    if dropped == 0 {
        return;
    }

    counter!(
        format!("{}_neighbors_dropped_total", METRICS_PREFIX),
        "axis" => axis.to_string(),
        "filter" => filter.to_string()
    )
    .increment(dropped as u64);
}

/// Helper to record a non-fatal diagnostic
pub fn record_diagnostic(diagnostic: Diagnostic) {
    counter!(
        format!("{}_diagnostics_total", METRICS_PREFIX),
        "diagnostic" => diagnostic.as_str()
    )
    .increment(1);
}
