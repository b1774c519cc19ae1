//! Prometheus metrics for a run.
//!
//! This module provides metrics for:
//! - Films processed, by final status
//! - Catalog lookups, by result
//! - Transfers (bytes moved or copied, duration, replaced duplicates)

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Registry holding every metric below.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    for metric in all_metrics() {
        // registering a fresh registry only fails on duplicate names
        let _ = registry.register(metric);
    }
    registry
});

// =============================================================================
// Films
// =============================================================================

/// Films processed by final status.
pub static FILMS_PROCESSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("filmsort_films_processed_total", "Total films processed"),
        &["status"], // "moved", "copied", "skipped", "ignored", "failed"
    )
    .unwrap()
});

// =============================================================================
// Catalog
// =============================================================================

/// Catalog lookups by result.
pub static CATALOG_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("filmsort_catalog_lookups_total", "Total catalog lookups"),
        &["result"], // "matched", "no_match", "skipped", "failed"
    )
    .unwrap()
});

// =============================================================================
// Transfers
// =============================================================================

/// Bytes transferred by mode.
pub static BYTES_TRANSFERRED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "filmsort_bytes_transferred_total",
            "Total bytes placed into destinations",
        ),
        &["mode"], // "move", "copy"
    )
    .unwrap()
});

/// Existing copies replaced by upgrades.
pub static DUPLICATES_REPLACED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "filmsort_duplicates_replaced_total",
        "Existing copies removed in favour of an upgrade",
    )
    .unwrap()
});

/// Duration of a single file transfer in seconds.
pub static TRANSFER_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "filmsort_transfer_duration_seconds",
            "Duration of file transfers",
        )
        .buckets(vec![0.01, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0, 900.0]),
        &["mode"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(FILMS_PROCESSED.clone()),
        Box::new(CATALOG_LOOKUPS.clone()),
        Box::new(BYTES_TRANSFERRED.clone()),
        Box::new(DUPLICATES_REPLACED.clone()),
        Box::new(TRANSFER_DURATION.clone()),
    ]
}

/// Encode all metrics as Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_includes_counters() {
        FILMS_PROCESSED.with_label_values(&["moved"]).inc();
        let text = gather_metrics();
        assert!(text.contains("filmsort_films_processed_total"));
    }
}
