use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

lazy_static! {
    // Store metrics
    pub static ref STORE_OPERATIONS: CounterVec = register_counter_vec!(
        "orders_store_operations_total",
        "Total number of aggregate store operations",
        &["operation", "status"]
    )
    .expect("metric cannot be created");

    pub static ref STORE_DURATION: HistogramVec = register_histogram_vec!(
        "orders_store_duration_seconds",
        "Aggregate store operation duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("metric cannot be created");

    // Cache metrics
    pub static ref CACHE_REQUESTS: CounterVec = register_counter_vec!(
        "orders_cache_requests_total",
        "Total number of cache lookups",
        &["lookup", "status"]
    )
    .expect("metric cannot be created");

    pub static ref CACHE_WRITE_FAILURES: CounterVec = register_counter_vec!(
        "orders_cache_write_failures_total",
        "Cache writes and invalidations that failed and were ignored",
        &["action"]
    )
    .expect("metric cannot be created");
}

/// Outcome of a cache lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
    Error,
}

impl CacheOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOutcome::Hit => "hit",
            CacheOutcome::Miss => "miss",
            CacheOutcome::Error => "error",
        }
    }
}

/// Get all metrics in Prometheus text format
pub fn gather_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Helper function to record a store operation
pub fn record_store_operation(operation: &str, success: bool, duration_secs: f64) {
    let status = if success { "success" } else { "error" };
    STORE_OPERATIONS
        .with_label_values(&[operation, status])
        .inc();
    STORE_DURATION
        .with_label_values(&[operation])
        .observe(duration_secs);
}

/// Helper function to record cache hit/miss/error
pub fn record_cache_request(lookup: &str, outcome: CacheOutcome) {
    CACHE_REQUESTS
        .with_label_values(&[lookup, outcome.as_str()])
        .inc();
}

/// Helper function to record an ignored cache write failure
pub fn record_cache_write_failure(action: &str) {
    CACHE_WRITE_FAILURES.with_label_values(&[action]).inc();
}
