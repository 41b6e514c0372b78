//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with SLO-aligned histograms
//! and standardized naming conventions.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

use crate::domain::Catalog;
use crate::errors::{Violation, ViolationKind};

/// Metrics prefix for all Museo metrics
pub const METRICS_PREFIX: &str = "museo";

/// SLO-aligned histogram buckets for request latency (in seconds)
/// Targets: P50 < 50ms, P99 < 150ms
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001, // 1ms
    0.005, // 5ms
    0.010, // 10ms
    0.025, // 25ms
    0.050, // 50ms - P50 target
    0.075, // 75ms
    0.100, // 100ms
    0.150, // 150ms - P99 target
    0.250, // 250ms
    0.500, // 500ms
    1.000, // 1s
    2.500, // 2.5s
    5.000, // 5s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Catalog mutations
    describe_counter!(
        format!("{}_mutations_total", METRICS_PREFIX),
        Unit::Count,
        "Catalog mutations by operation and outcome"
    );

    describe_counter!(
        format!("{}_violations_total", METRICS_PREFIX),
        Unit::Count,
        "Rule violations reported to callers"
    );

    describe_histogram!(
        format!("{}_commit_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Time spent committing a change set"
    );

    // Catalog state
    describe_gauge!(
        format!("{}_artworks_by_state", METRICS_PREFIX),
        Unit::Count,
        "Artworks in each lifecycle state"
    );

    describe_gauge!(
        format!("{}_restorers_occupied", METRICS_PREFIX),
        Unit::Count,
        "Restorers currently on an open restoration"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Count one accepted or rejected mutation
pub fn record_mutation(operation: &'static str, accepted: bool) {
    let outcome = if accepted { "accepted" } else { "rejected" };

    counter!(
        format!("{}_mutations_total", METRICS_PREFIX),
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_violations(violations: &[Violation]) {
    for violation in violations {
        let kind = match violation.kind {
            ViolationKind::Validation => "validation",
            ViolationKind::Conflict => "conflict",
        };
        counter!(
            format!("{}_violations_total", METRICS_PREFIX),
            "kind" => kind
        )
        .increment(1);
    }
}

pub fn record_commit(duration_secs: f64) {
    histogram!(format!("{}_commit_duration_seconds", METRICS_PREFIX)).record(duration_secs);
}

/// Refresh the state gauges from a catalog snapshot
pub fn record_catalog_state(catalog: &Catalog) {
    for (state, count) in catalog.state_counts() {
        gauge!(
            format!("{}_artworks_by_state", METRICS_PREFIX),
            "state" => state.as_str()
        )
        .set(count as f64);
    }

    gauge!(format!("{}_restorers_occupied", METRICS_PREFIX)).set(catalog.occupied_restorers() as f64);
}
