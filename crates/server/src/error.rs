use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use llm::{LlmError, NormalizedError};
use rephrase::{ModelOutputError, RephraseError, ValidationError};
use serde::Serialize;
use serde_json::Value;

pub type ApiResult<T> = Result<T, ApiError>;

/// Everything a handler can fail with
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{}", .0.public_message())]
    Provider(#[from] LlmError),

    #[error("The model returned an invalid response.")]
    ModelOutput(#[from] ModelOutputError),

    #[error("Route not found.")]
    NotFound,

    #[error("Internal server error.")]
    Internal(String),
}

/// Error body shared by JSON responses and SSE `error` events
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub details: Value,
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Provider(err) => StatusCode::from_u16(err.normalize().status_code)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ApiError::ModelOutput(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Provider(err) => err.code(),
            ApiError::ModelOutput(_) | ApiError::Internal(_) => "INTERNAL_ERROR",
            ApiError::NotFound => "NOT_FOUND",
        }
    }

    pub fn retry_after_seconds(&self) -> Option<u64> {
        match self {
            ApiError::Provider(err) => err.normalize().retry_after_seconds,
            _ => None,
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::Provider(err) => ErrorBody::from(err.normalize()),
            ApiError::Validation(err) => ErrorBody {
                code: self.error_code().to_string(),
                message: self.to_string(),
                details: serde_json::to_value(&err.issues)
                    .unwrap_or_else(|_| Value::Array(Vec::new())),
            },
            _ => ErrorBody {
                code: self.error_code().to_string(),
                message: self.to_string(),
                details: Value::Array(Vec::new()),
            },
        }
    }

    /// Short label for request metrics
    pub fn outcome(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::Provider(_) => "provider_error",
            ApiError::ModelOutput(_) => "model_output_error",
            ApiError::NotFound => "not_found",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl From<NormalizedError> for ErrorBody {
    fn from(err: NormalizedError) -> Self {
        ErrorBody {
            code: err.code,
            message: err.message,
            details: Value::Array(Vec::new()),
        }
    }
}

impl From<RephraseError> for ApiError {
    fn from(err: RephraseError) -> Self {
        match err {
            RephraseError::Provider(err) => ApiError::Provider(err),
            RephraseError::ModelOutput(err) => ApiError::ModelOutput(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::ModelOutput(err) => {
                tracing::error!(error = %err, "model output failed the response contract")
            }
            ApiError::Internal(detail) => tracing::error!(detail = %detail, "internal error"),
            ApiError::Provider(err) => {
                tracing::warn!(code = err.code(), error = %err, "provider call failed")
            }
            ApiError::Validation(_) | ApiError::NotFound => {}
        }

        let status = self.status_code();
        let mut response = (status, Json(self.body())).into_response();

        if let Some(seconds) = self.retry_after_seconds() {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(seconds));
        }

        response
    }
}
