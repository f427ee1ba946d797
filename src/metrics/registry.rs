// Prometheus metrics registry and collectors
// Author: kelexine (https://github.com/kelexine)

use crate::error::{Result, ServiceError};
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec_with_registry, register_gauge_vec_with_registry,
    register_histogram_vec_with_registry, CounterVec, Encoder, GaugeVec, HistogramVec, Opts,
    Registry, TextEncoder,
};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // REQUEST METRICS
    // ============================================================================

    /// Total number of API requests
    pub static ref REQUESTS_TOTAL: CounterVec = register_counter_vec_with_registry!(
        Opts::new("requests_total", "Total number of API requests"),
        &["endpoint", "outcome"], // outcome: success, failure
        REGISTRY
    ).unwrap();

    // ============================================================================
    // LLM API METRICS
    // ============================================================================

    /// Total chat-completion calls
    pub static ref LLM_CALLS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("llm_calls_total", "Total chat-completion calls"),
        &["outcome"], // outcome: success, failure, unconfigured
        REGISTRY
    ).unwrap();

    /// Chat-completion call duration
    pub static ref LLM_CALL_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        prometheus::HistogramOpts::new("llm_call_duration_seconds", "Chat-completion call duration")
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["outcome"],
        REGISTRY
    ).unwrap();

    // ============================================================================
    // TRANSLATION CACHE METRICS
    // ============================================================================

    /// Translation cache operations
    pub static ref TRANSLATION_CACHE_OPERATIONS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("translation_cache_operations_total", "Total translation cache operations"),
        &["operation"], // operation: hit, miss, store, clear
        REGISTRY
    ).unwrap();

    /// Translation cache entries by state, refreshed on every stats scan
    pub static ref TRANSLATION_CACHE_ENTRIES: GaugeVec = register_gauge_vec_with_registry!(
        Opts::new("translation_cache_entries", "Translation cache entries"),
        &["state"], // state: valid, expired
        REGISTRY
    ).unwrap();
}

/// Gather all metrics and return as Prometheus text format
pub fn gather_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ServiceError::Internal(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| ServiceError::Internal(format!("Metrics are not UTF-8: {}", e)))
}
