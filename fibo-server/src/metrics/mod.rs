//! Prometheus Metrics for the Fibonacci service
//!
//! - Range requests per transport
//! - Where each returned term came from (cache or computed)
//! - Cache operations and per-request cache disablement

use lazy_static::lazy_static;
use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, TextEncoder, register_histogram_vec,
    register_int_counter, register_int_counter_vec,
};

lazy_static! {
    /// Range requests by transport and outcome (ok, timeout, rejected, error)
    pub static ref REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "fibonacci_requests_total",
        "Total number of range requests by transport and outcome",
        &["transport", "outcome"]
    ).unwrap();

    /// Range request latency in seconds
    pub static ref REQUEST_DURATION: HistogramVec = register_histogram_vec!(
        "fibonacci_request_duration_seconds",
        "Range request latency in seconds",
        &["transport"],
        vec![0.0001, 0.001, 0.01, 0.1, 1.0, 10.0]
    ).unwrap();

    /// Terms returned by source (cache, computed)
    pub static ref VALUES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "fibonacci_values_total",
        "Total number of sequence terms returned by source",
        &["source"]
    ).unwrap();

    /// Cache operations by type (get, set) and status
    pub static ref CACHE_OPS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "fibonacci_cache_operations_total",
        "Total number of cache operations",
        &["operation", "status"]
    ).unwrap();

    /// Requests that stopped trusting the cache
    pub static ref CACHE_DISABLED_TOTAL: IntCounter = register_int_counter!(
        "fibonacci_cache_disabled_total",
        "Number of requests whose cache gate disabled itself"
    ).unwrap();

    /// Cache entries that could not be parsed
    pub static ref CACHE_CORRUPT_TOTAL: IntCounter = register_int_counter!(
        "fibonacci_cache_corrupt_entries_total",
        "Number of cache entries that failed to parse"
    ).unwrap();
}

/// Initialize metrics so they appear before first use
pub fn init_metrics() {
    let _ = &*REQUESTS_TOTAL;
    let _ = &*REQUEST_DURATION;
    let _ = &*VALUES_TOTAL;
    let _ = &*CACHE_OPS_TOTAL;
    let _ = &*CACHE_DISABLED_TOTAL;
    let _ = &*CACHE_CORRUPT_TOTAL;

    tracing::info!("Prometheus metrics initialized");
}

/// Encode all metrics in Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record a finished range request
pub fn record_request(transport: &str, outcome: &str, duration_secs: f64) {
    REQUESTS_TOTAL
        .with_label_values(&[transport, outcome])
        .inc();
    REQUEST_DURATION
        .with_label_values(&[transport])
        .observe(duration_secs);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_contains_registered_metrics() {
        init_metrics();
        VALUES_TOTAL.with_label_values(&["computed"]).inc();
        record_request("http", "ok", 0.002);

        let text = encode_metrics().unwrap();
        assert!(text.contains("fibonacci_values_total"));
        assert!(text.contains("fibonacci_request_duration_seconds"));
    }
}
