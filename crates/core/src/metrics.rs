//! Prometheus metrics for sync runs.
//!
//! This module provides metrics for:
//! - Reconciliation outcomes per library item
//! - Torrent dispatch (added, already present, failures)
//! - Notifications

use once_cell::sync::Lazy;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

// =============================================================================
// Reconciliation
// =============================================================================

/// Tracking-id matches processed, by library and outcome.
pub static ITEMS_PROCESSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "relsync_items_processed_total",
            "Total tracking-id matches processed",
        ),
        // outcome: "matched", "mismatched", "skipped_*", "failed"
        &["library", "outcome"],
    )
    .unwrap()
});

/// Sync run duration in seconds.
pub static RUN_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("relsync_run_duration_seconds", "Duration of sync runs")
            .buckets(vec![1.0, 10.0, 30.0, 60.0, 300.0, 900.0, 1800.0, 3600.0]),
        &["library"],
    )
    .unwrap()
});

// =============================================================================
// Dispatch
// =============================================================================

/// Torrents added to the download client.
pub static TORRENTS_ADDED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("relsync_torrents_added_total", "Total torrents added").unwrap()
});

/// Recommended torrents already present in the download client.
pub static TORRENTS_ALREADY_PRESENT: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "relsync_torrents_already_present_total",
        "Total recommended torrents skipped because the client already had them",
    )
    .unwrap()
});

/// Dispatch batches aborted, by reason.
pub static DISPATCH_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("relsync_dispatch_failures_total", "Total failed dispatch batches"),
        &["reason"], // "unsupported_tracker", "resolution", "client"
    )
    .unwrap()
});

// =============================================================================
// Notifications
// =============================================================================

/// Notifications that failed to post.
pub static NOTIFICATION_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "relsync_notification_failures_total",
        "Total notifications that failed to post",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(ITEMS_PROCESSED.clone()),
        Box::new(RUN_DURATION.clone()),
        Box::new(TORRENTS_ADDED.clone()),
        Box::new(TORRENTS_ALREADY_PRESENT.clone()),
        Box::new(DISPATCH_FAILURES.clone()),
        Box::new(NOTIFICATION_FAILURES.clone()),
    ]
}

/// Registry holding every metric above.
pub fn registry() -> Result<Registry, prometheus::Error> {
    let registry = Registry::new();
    for metric in all_metrics() {
        registry.register(metric)?;
    }
    Ok(registry)
}

/// Text exposition of a registry.
pub fn encode_text(registry: &Registry) -> Result<String, prometheus::Error> {
    let mut buf = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_encodes_counters() {
        let registry = registry().unwrap();
        ITEMS_PROCESSED
            .with_label_values(&["sonarr", "matched"])
            .inc();
        TORRENTS_ADDED.inc();

        let text = encode_text(&registry).unwrap();
        assert!(text.contains("relsync_items_processed_total"));
        assert!(text.contains("relsync_torrents_added_total"));
    }
}
