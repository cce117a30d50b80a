//! Metrics and observability utilities
//!
//! Provides Prometheus metrics for the link graph engine
//! with standardized naming conventions.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all LinkForge metrics
pub const METRICS_PREFIX: &str = "linkforge";

/// Buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
];

/// Buckets for outbound link checks (slow remote hosts, retries)
pub const LINK_CHECK_BUCKETS: &[f64] = &[
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.000,  // 2s
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
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

    // Authority metrics
    describe_counter!(
        format!("{}_authority_runs_total", METRICS_PREFIX),
        Unit::Count,
        "Authority propagation runs"
    );

    describe_histogram!(
        format!("{}_authority_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Authority propagation latency in seconds"
    );

    describe_gauge!(
        format!("{}_authority_iterations", METRICS_PREFIX),
        Unit::Count,
        "Iterations used by the last authority run"
    );

    // Balance metrics
    describe_gauge!(
        format!("{}_orphan_articles", METRICS_PREFIX),
        Unit::Count,
        "Orphan articles found by the last analysis"
    );

    describe_gauge!(
        format!("{}_dead_end_articles", METRICS_PREFIX),
        Unit::Count,
        "Dead-end articles found by the last analysis"
    );

    describe_gauge!(
        format!("{}_imbalance_ratio", METRICS_PREFIX),
        "Inbound link imbalance ratio (0-1) from the last analysis"
    );

    // Verification metrics
    describe_counter!(
        format!("{}_link_checks_total", METRICS_PREFIX),
        Unit::Count,
        "External link checks by verdict"
    );

    describe_histogram!(
        format!("{}_link_check_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "External link check latency in seconds, retries included"
    );

    describe_counter!(
        format!("{}_links_newly_broken_total", METRICS_PREFIX),
        Unit::Count,
        "External links that turned broken"
    );

    // Repair metrics
    describe_counter!(
        format!("{}_repair_actions_total", METRICS_PREFIX),
        Unit::Count,
        "Repair actions by kind and outcome"
    );

    describe_counter!(
        format!("{}_suggestions_total", METRICS_PREFIX),
        Unit::Count,
        "Internal link suggestions produced"
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

/// Helper to record an authority propagation run
pub fn record_authority(duration_secs: f64, iterations: usize, converged: bool) {
    let status = if converged { "converged" } else { "capped" };

    counter!(
        format!("{}_authority_runs_total", METRICS_PREFIX),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(format!("{}_authority_duration_seconds", METRICS_PREFIX)).record(duration_secs);

    gauge!(format!("{}_authority_iterations", METRICS_PREFIX)).set(iterations as f64);
}

/// Helper to record the outcome of a balance analysis
pub fn record_balance(platform_id: &str, orphans: usize, dead_ends: usize, imbalance_ratio: f64) {
    gauge!(
        format!("{}_orphan_articles", METRICS_PREFIX),
        "platform" => platform_id.to_string()
    )
    .set(orphans as f64);

    gauge!(
        format!("{}_dead_end_articles", METRICS_PREFIX),
        "platform" => platform_id.to_string()
    )
    .set(dead_ends as f64);

    gauge!(
        format!("{}_imbalance_ratio", METRICS_PREFIX),
        "platform" => platform_id.to_string()
    )
    .set(imbalance_ratio);
}

/// Helper to record a single external link check
pub fn record_link_check(duration_secs: f64, verdict: &str, newly_broken: bool) {
    counter!(
        format!("{}_link_checks_total", METRICS_PREFIX),
        "verdict" => verdict.to_string()
    )
    .increment(1);

    histogram!(format!("{}_link_check_duration_seconds", METRICS_PREFIX)).record(duration_secs);

    if newly_broken {
        counter!(format!("{}_links_newly_broken_total", METRICS_PREFIX)).increment(1);
    }
}

/// Helper to record one repair action
pub fn record_repair_action(kind: &str, outcome: &str, dry_run: bool) {
    counter!(
        format!("{}_repair_actions_total", METRICS_PREFIX),
        "kind" => kind.to_string(),
        "outcome" => outcome.to_string(),
        "dry_run" => dry_run.to_string()
    )
    .increment(1);
}

/// Histogram names paired with their bucket boundaries, for the exporter
pub fn histogram_buckets() -> Vec<(String, &'static [f64])> {
    vec![
        (format!("{}_request_duration_seconds", METRICS_PREFIX), LATENCY_BUCKETS),
        (format!("{}_authority_duration_seconds", METRICS_PREFIX), LATENCY_BUCKETS),
        (format!("{}_link_check_duration_seconds", METRICS_PREFIX), LINK_CHECK_BUCKETS),
    ]
}

/// Helper to record suggestion output
pub fn record_suggestions(count: usize) {
    counter!(format!("{}_suggestions_total", METRICS_PREFIX)).increment(count as u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets_sorted() {
        for buckets in [LATENCY_BUCKETS, LINK_CHECK_BUCKETS] {
            let mut prev = 0.0;
            for &bucket in buckets {
                assert!(bucket > prev);
                prev = bucket;
            }
        }
    }

    #[test]
    fn test_link_checks_use_their_own_buckets() {
        let buckets = histogram_buckets();
        let (_, link_check) = buckets
            .iter()
            .find(|(name, _)| name == "linkforge_link_check_duration_seconds")
            .unwrap();
        assert_eq!(*link_check, LINK_CHECK_BUCKETS);
        assert!(buckets.iter().all(|(name, _)| name.starts_with(METRICS_PREFIX)));
    }

    #[test]
    fn test_recorders_without_exporter() {
        // No recorder installed: every helper must be a no-op
        let metrics = RequestMetrics::start("GET", "/v1/health");
        metrics.finish(200);
        record_authority(0.01, 12, true);
        record_balance("p", 1, 2, 0.3);
        record_link_check(0.2, "broken", true);
        record_repair_action("create_internal_link", "planned", true);
        record_suggestions(3);
    }
}
