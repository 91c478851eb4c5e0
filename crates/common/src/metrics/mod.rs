//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with standardized naming conventions.

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// Metrics prefix for all Wayfarer metrics
pub const METRICS_PREFIX: &str = "wayfarer";

/// Histogram buckets for retrieval latency (in seconds)
pub const SEARCH_BUCKETS: &[f64] = &[
    0.005, // 5ms
    0.010, // 10ms
    0.025, // 25ms
    0.050, // 50ms
    0.100, // 100ms
    0.250, // 250ms
    0.500, // 500ms
    1.000, // 1s
    2.500, // 2.5s
];

/// Buckets for generation latency (network round-trip to a model provider)
pub const GENERATION_BUCKETS: &[f64] = &[
    0.250, // 250ms
    0.500, // 500ms
    1.000, // 1s
    2.000, // 2s
    5.000, // 5s
    10.00, // 10s
    30.00, // 30s
    60.00, // 60s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Pipeline metrics
    describe_counter!(
        format!("{}_answers_total", METRICS_PREFIX),
        Unit::Count,
        "Total answer pipeline invocations"
    );

    // Search metrics
    describe_counter!(
        format!("{}_search_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total retrieval queries"
    );

    describe_counter!(
        format!("{}_search_degraded_total", METRICS_PREFIX),
        Unit::Count,
        "Retrieval queries that degraded to an empty result set"
    );

    describe_histogram!(
        format!("{}_search_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Retrieval latency in seconds"
    );

    describe_gauge!(
        format!("{}_search_results_count", METRICS_PREFIX),
        Unit::Count,
        "Number of results returned from the last retrieval"
    );

    // Generation metrics
    describe_counter!(
        format!("{}_generation_failures_total", METRICS_PREFIX),
        Unit::Count,
        "Chat completions that soft-failed to an error answer"
    );

    describe_histogram!(
        format!("{}_generation_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Chat completion latency in seconds"
    );

    // Judge metrics
    describe_counter!(
        format!("{}_judge_parse_failures_total", METRICS_PREFIX),
        Unit::Count,
        "Relevance verdicts that fell back to UNKNOWN"
    );

    // Embedding metrics
    describe_counter!(
        format!("{}_embedding_errors_total", METRICS_PREFIX),
        Unit::Count,
        "Total embedding request errors"
    );

    tracing::info!("Metrics registered");
}
