// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for dynamic DNS updates.
//!
//! All metrics use the `rfc2136_` namespace prefix and are registered in
//! [`METRICS_REGISTRY`]. The crate does not serve them; embed the registry in
//! your own `/metrics` endpoint or call [`gather_metrics`].
//!
//! # Example
//!
//! ```rust,no_run
//! use rfc2136::metrics::gather_metrics;
//!
//! let text = gather_metrics().unwrap_or_default();
//! println!("{text}");
//! ```

use crate::constants::METRICS_NAMESPACE;
use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

/// Global Prometheus metrics registry
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Update Metrics
// ============================================================================

/// Total number of dynamic updates by operation and result
///
/// Labels:
/// - `operation`: `upsert` or `delete`
/// - `result`: `success` or `error`
pub static UPDATES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_updates_total"),
        "Total number of dynamic DNS updates by operation and result",
    );
    let counter = CounterVec::new(opts, &["operation", "result"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of dynamic updates in seconds, including zone discovery
///
/// Labels:
/// - `operation`: `upsert` or `delete`
pub static UPDATE_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_update_duration_seconds"),
        "Duration of dynamic DNS updates in seconds by operation",
    )
    .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]);
    let histogram = HistogramVec::new(opts, &["operation"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Discovery Metrics
// ============================================================================

/// Total number of SOA queries by result
///
/// Labels:
/// - `result`: `found`, `not_found` (rcode or empty answer), or `error` (network)
pub static SOA_QUERIES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_soa_queries_total"),
        "Total number of SOA queries sent during zone discovery by result",
    );
    let counter = CounterVec::new(opts, &["result"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Error Metrics
// ============================================================================

/// Total number of failed operations by reason
///
/// Labels:
/// - `reason`: stable reason code (e.g., `UpdateRefused`, `Timeout`)
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of failed dynamic DNS operations by reason",
    );
    let counter = CounterVec::new(opts, &["reason"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a successful update
pub fn record_update_success(operation: &str, duration: Duration) {
    UPDATES_TOTAL
        .with_label_values(&[operation, "success"])
        .inc();
    UPDATE_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration.as_secs_f64());
}

/// Record a failed update and its reason
pub fn record_update_error(operation: &str, reason: &str, duration: Duration) {
    UPDATES_TOTAL
        .with_label_values(&[operation, "error"])
        .inc();
    UPDATE_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration.as_secs_f64());
    record_error(reason);
}

/// Record the result of one SOA query
pub fn record_soa_query(result: &str) {
    SOA_QUERIES_TOTAL.with_label_values(&[result]).inc();
}

/// Record an error by reason
pub fn record_error(reason: &str) {
    ERRORS_TOTAL.with_label_values(&[reason]).inc();
}

/// Gather all metrics in Prometheus text exposition format
///
/// # Errors
///
/// Returns an error if the metrics cannot be encoded.
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
