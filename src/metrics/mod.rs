//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Request counts per method and outcome
//! - Request latency per method

use crate::error::{ClientError, ClientResult};

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

lazy_static! {
    pub static ref RPC_REQUESTS: CounterVec = register_counter_vec!(
        "fmchain_rpc_requests_total",
        "Total requests by method and outcome",
        &["method", "outcome"]
    ).unwrap();

    pub static ref RPC_LATENCY: HistogramVec = register_histogram_vec!(
        "fmchain_rpc_latency_seconds",
        "Request round-trip latency",
        &["method"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).unwrap();
}

/// Outcome label for a finished request
pub fn outcome_label<T>(result: &ClientResult<T>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(e) => match e.root() {
            ClientError::Transport { .. } => "transport_error",
            ClientError::Protocol { .. } | ClientError::EmptyResponse => "rejected",
            _ => "invalid_response",
        },
    }
}

// Helper functions to record metrics

pub fn record_request(method: &str, outcome: &str, latency_secs: f64) {
    RPC_REQUESTS.with_label_values(&[method, outcome]).inc();
    RPC_LATENCY.with_label_values(&[method]).observe(latency_secs);
}

/// Render the default registry in text exposition format
pub fn gather_text() -> ClientResult<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ClientError::Decode {
            what: "metrics".to_string(),
            message: e.to_string(),
        })?;
    String::from_utf8(buffer).map_err(|e| ClientError::Decode {
        what: "metrics".to_string(),
        message: e.to_string(),
    })
}
