//! API route handlers
//!
//! - `health`: liveness, readiness and metrics
//! - `rephrase`: the synchronous `POST /rephrase`
//! - `stream`: `POST /rephrase/stream` over server-sent events

pub mod health;
pub mod rephrase;
pub mod stream;

use crate::error::ApiError;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use ::rephrase::{validate_body, ValidationError, ValidationIssue, MAX_TEXT_CHARS};
use serde_json::json;

/// API version and base info
///
/// # Response
///
/// ```json
/// {
///   "name": "Rephrase Server",
///   "version": "0.1.0",
///   "styles": ["professional", "casual", "polite", "social"],
///   "endpoints": ["..."]
/// }
/// ```
pub async fn api_info() -> impl IntoResponse {
    Json(json!({
        "name": "Rephrase Server",
        "version": env!("CARGO_PKG_VERSION"),
        "styles": llm::Style::ALL,
        "endpoints": [
            "POST /rephrase",
            "POST /rephrase/stream",
            "GET /health",
            "GET /ready",
            "GET /metrics"
        ]
    }))
}

/// 404 Not Found handler
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Validated `text` from a raw request body.
///
/// A body over the size limit can only carry an over-long `text`, so the
/// limit rejection is reported as `max_length` like any other long input.
pub(crate) fn read_text(body: Result<Bytes, BytesRejection>) -> Result<String, ApiError> {
    match body {
        Ok(bytes) => Ok(validate_body(&bytes)?),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            let issue = ValidationIssue::max_length("text", MAX_TEXT_CHARS);
            Err(ValidationError::single(issue).into())
        }
        Err(rejection) => Err(ApiError::Internal(rejection.body_text())),
    }
}
