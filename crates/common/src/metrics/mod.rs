//! Metrics and observability utilities
//!
//! Thin helpers over the `metrics` facade with standardized naming.
//! Without an installed recorder every call is a no-op.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};

/// Metrics prefix for all ResearchForge metrics
pub const METRICS_PREFIX: &str = "researchforge";

/// Buckets for generation latency (remote model calls are slow)
pub const GENERATION_BUCKETS: &[f64] = &[
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.000,  // 2s
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
    60.00,  // 60s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Corpus metrics
    describe_counter!(
        format!("{}_documents_loaded_total", METRICS_PREFIX),
        Unit::Count,
        "Documents successfully extracted and chunked"
    );

    describe_counter!(
        format!("{}_documents_skipped_total", METRICS_PREFIX),
        Unit::Count,
        "Documents skipped during corpus load"
    );

    describe_gauge!(
        format!("{}_index_chunks", METRICS_PREFIX),
        Unit::Count,
        "Chunks held by the ranking index"
    );

    // Retrieval metrics
    describe_counter!(
        format!("{}_retrieval_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total ranking index queries"
    );

    describe_histogram!(
        format!("{}_retrieval_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Ranking index query latency in seconds"
    );

    describe_gauge!(
        format!("{}_retrieval_results_count", METRICS_PREFIX),
        Unit::Count,
        "Chunks returned by the last ranking index query"
    );

    // External snippet metrics
    describe_counter!(
        format!("{}_snippet_fetches_total", METRICS_PREFIX),
        Unit::Count,
        "Snippet fetches by outcome"
    );

    // Generation metrics
    describe_counter!(
        format!("{}_generation_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Generation calls by stage and status"
    );

    describe_histogram!(
        format!("{}_generation_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Generation latency in seconds"
    );

    // Pipeline metrics
    describe_counter!(
        format!("{}_pipeline_runs_total", METRICS_PREFIX),
        Unit::Count,
        "Research runs by outcome"
    );

    tracing::info!("Metrics registered");
}

/// Record the outcome of a corpus load
pub fn record_corpus_load(loaded: usize, skipped: usize, chunks: usize) {
    counter!(format!("{}_documents_loaded_total", METRICS_PREFIX)).increment(loaded as u64);
    counter!(format!("{}_documents_skipped_total", METRICS_PREFIX)).increment(skipped as u64);
    gauge!(format!("{}_index_chunks", METRICS_PREFIX)).set(chunks as f64);
}

/// Helper to record retrieval metrics
pub fn record_retrieval(duration_secs: f64, result_count: usize) {
    counter!(format!("{}_retrieval_queries_total", METRICS_PREFIX)).increment(1);

    histogram!(format!("{}_retrieval_duration_seconds", METRICS_PREFIX)).record(duration_secs);

    gauge!(format!("{}_retrieval_results_count", METRICS_PREFIX)).set(result_count as f64);
}

/// Helper to record snippet fetch outcome
pub fn record_snippet_fetch(source: &str, degraded: bool) {
    let outcome = if degraded { "degraded" } else { "success" };

    counter!(
        format!("{}_snippet_fetches_total", METRICS_PREFIX),
        "source" => source.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Helper to record generation metrics
pub fn record_generation(duration_secs: f64, stage: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_generation_requests_total", METRICS_PREFIX),
        "stage" => stage.to_string(),
        "status" => status
    )
    .increment(1);

    if success {
        histogram!(
            format!("{}_generation_duration_seconds", METRICS_PREFIX),
            "stage" => stage.to_string()
        )
        .record(duration_secs);
    }
}

/// Helper to record a finished research run
pub fn record_pipeline_run(success: bool) {
    let outcome = if success { "completed" } else { "failed" };

    counter!(
        format!("{}_pipeline_runs_total", METRICS_PREFIX),
        "outcome" => outcome
    )
    .increment(1);
}
