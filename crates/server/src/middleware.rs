use crate::telemetry::record_http_response;
use axum::extract::Request;
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation ID for one request, stored in request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Request ID injection middleware
pub async fn request_id(mut request: Request, next: Next) -> Response {
    // Reuse the caller's ID when it is a valid header value
    let id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    request.extensions_mut().insert(RequestId(id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

fn is_event_stream(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/event-stream"))
}

/// Access log plus the per-status response counter
///
/// For `/rephrase/stream` the response is ready once the headers are, so
/// the line marks the stream opening; the stream's own outcome is recorded
/// by the route.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let duration_ms = started.elapsed().as_millis() as u64;
    record_http_response(status);

    if is_event_stream(&response) {
        tracing::info!(%method, %path, %request_id, duration_ms, "stream opened");
    } else if status.is_server_error() {
        tracing::warn!(%method, %path, %status, %request_id, duration_ms, "request failed");
    } else {
        tracing::info!(%method, %path, %status, %request_id, duration_ms, "request completed");
    }

    response
}
