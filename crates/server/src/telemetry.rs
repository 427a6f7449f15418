//! Logging and metrics setup, plus the handful of metric names we emit.

use axum::http::StatusCode;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

pub const REQUESTS_TOTAL: &str = "rephrase_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "rephrase_request_duration_seconds";
pub const STREAM_EVENTS_TOTAL: &str = "rephrase_stream_events_total";
pub const HTTP_RESPONSES_TOTAL: &str = "rephrase_http_responses_total";

/// Install the JSON tracing subscriber
pub fn init_tracing(log_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json()
        .init();
}

/// Install the global Prometheus recorder
pub fn install_metrics_recorder() -> anyhow::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

pub fn record_request(endpoint: &'static str, outcome: &'static str, elapsed: Duration) {
    metrics::counter!(REQUESTS_TOTAL, "endpoint" => endpoint, "outcome" => outcome).increment(1);
    metrics::histogram!(REQUEST_DURATION_SECONDS, "endpoint" => endpoint)
        .record(elapsed.as_secs_f64());
}

pub fn record_stream_event(event: &'static str) {
    metrics::counter!(STREAM_EVENTS_TOTAL, "event" => event).increment(1);
}

pub fn record_http_response(status: StatusCode) {
    metrics::counter!(HTTP_RESPONSES_TOTAL, "status" => status.as_u16().to_string()).increment(1);
}
