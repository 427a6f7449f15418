use super::read_text;
use crate::error::{ApiError, ApiResult};
use crate::state::ServerState;
use crate::telemetry::record_request;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::Json;
use llm::LlmError;
use rephrase::{generate_rephrases, RephraseResult};
use std::sync::Arc;
use std::time::Instant;

const ENDPOINT: &str = "rephrase";

/// Rephrase text into all four styles in one response
///
/// The body is read raw and parsed by [`rephrase::validate_body`] so that
/// malformed JSON, wrong types, missing fields and oversized bodies all come
/// back as `VALIDATION_ERROR` instead of framework rejections. The whole call
/// is bounded by `timeout_secs`; expiry answers `504 LLM_TIMEOUT`.
///
/// # Request
///
/// ```json
/// { "text": "Hey guys, let's huddle about AI." }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "professional": "...",
///   "casual": "...",
///   "polite": "...",
///   "social": "..."
/// }
/// ```
pub async fn rephrase(
    State(state): State<Arc<ServerState>>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<RephraseResult>> {
    let started = Instant::now();
    let outcome = match tokio::time::timeout(state.config.timeout(), run(&state, body)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::warn!(timeout_secs = state.config.timeout_secs, "rephrase timed out");
            Err(ApiError::Provider(LlmError::Timeout))
        }
    };

    let label = match &outcome {
        Ok(_) => "ok",
        Err(err) => err.outcome(),
    };
    record_request(ENDPOINT, label, started.elapsed());

    outcome.map(Json)
}

async fn run(
    state: &ServerState,
    body: Result<Bytes, BytesRejection>,
) -> Result<RephraseResult, ApiError> {
    // validation first: no provider is built for a bad request
    let text = read_text(body)?;
    let provider = state.provider()?;

    tracing::debug!(provider = provider.name(), chars = text.chars().count(), "rephrasing");
    Ok(generate_rephrases(provider.as_ref(), &text).await?)
}
