use crate::state::ServerState;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use std::time::SystemTime;

/// Global server start time for uptime calculation
static SERVER_START_TIME: once_cell::sync::Lazy<SystemTime> =
    once_cell::sync::Lazy::new(SystemTime::now);

fn uptime_seconds() -> u64 {
    SERVER_START_TIME
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Health check endpoint (liveness)
/// Returns 200 if server is running
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "rephrase-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds(),
    }))
}

/// Readiness check endpoint
///
/// Builds a provider through the factory (no network I/O). Answers 503 when
/// the current configuration can't produce one, e.g. real mode without
/// `ALLOW_REAL_LLM`.
pub async fn readiness_check(State(state): State<Arc<ServerState>>) -> Response {
    match state.provider() {
        Ok(provider) => Json(json!({
            "status": "ready",
            "service": "rephrase-server",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "uptime_seconds": uptime_seconds(),
            "provider": provider.name(),
        }))
        .into_response(),
        Err(err) => {
            tracing::warn!(code = err.code(), error = %err, "provider unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unavailable",
                    "service": "rephrase-server",
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                    "code": err.code(),
                    "message": err.public_message(),
                })),
            )
                .into_response()
        }
    }
}

/// Prometheus metrics endpoint
pub async fn metrics(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.render_metrics(),
    )
}
