// Metrics module for Prometheus observability
// Author: kelexine (https://github.com/kelexine)

mod registry;

pub use registry::{
    gather_metrics,
    LLM_CALLS,
    LLM_CALL_DURATION,
    REQUESTS_TOTAL,
    TRANSLATION_CACHE_ENTRIES,
    TRANSLATION_CACHE_OPERATIONS,
};

/// Helper to record request metrics
pub fn record_request(endpoint: &str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    REQUESTS_TOTAL.with_label_values(&[endpoint, outcome]).inc();
}

/// Helper to record chat-completion calls
pub fn record_llm_call(outcome: &str, duration_secs: f64) {
    LLM_CALLS.with_label_values(&[outcome]).inc();
    LLM_CALL_DURATION
        .with_label_values(&[outcome])
        .observe(duration_secs);
}

/// Helpers to record translation cache operations
pub fn record_translation_cache_hit() {
    TRANSLATION_CACHE_OPERATIONS.with_label_values(&["hit"]).inc();
}

pub fn record_translation_cache_miss() {
    TRANSLATION_CACHE_OPERATIONS.with_label_values(&["miss"]).inc();
}

pub fn record_translation_cache_store() {
    TRANSLATION_CACHE_OPERATIONS.with_label_values(&["store"]).inc();
}

pub fn record_translation_cache_clear() {
    TRANSLATION_CACHE_OPERATIONS.with_label_values(&["clear"]).inc();
}

pub fn update_translation_cache_entries(valid: usize, expired: usize) {
    TRANSLATION_CACHE_ENTRIES
        .with_label_values(&["valid"])
        .set(valid as f64);
    TRANSLATION_CACHE_ENTRIES
        .with_label_values(&["expired"])
        .set(expired as f64);
}
