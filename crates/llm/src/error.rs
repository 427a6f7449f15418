//! Provider failure taxonomy.
//!
//! Every upstream failure is folded into [`LlmError`] before it leaves this
//! crate, so callers never see SDK or transport types. The table below is the
//! whole contract:
//!
//! | Variant | Status | Code |
//! |---------|--------|------|
//! | [`RealCallsDisabled`](LlmError::RealCallsDisabled) | 403 | `REAL_LLM_DISABLED` |
//! | [`RateLimited`](LlmError::RateLimited) | 429 | `RATE_LIMIT_EXCEEDED` |
//! | [`Timeout`](LlmError::Timeout) | 504 | `LLM_TIMEOUT` |
//! | `Connection`, `Authentication`, `DeploymentNotFound`, `Rejected`, `UpstreamInternal`, `Failure` | 502 | `LLM_PROVIDER_FAILURE` |
//! | [`InvalidConfig`](LlmError::InvalidConfig) | 500 | `INTERNAL_ERROR` |
//!
//! New upstream failure modes are added to [`translate`], never as extra
//! catch sites in the providers.

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Normalized provider failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlmError {
    #[error("Real LLM calls are disabled. Set ALLOW_REAL_LLM=1 to enable them.")]
    RealCallsDisabled,

    #[error("Too many requests. Please retry after the specified time.")]
    RateLimited { retry_after_seconds: Option<u64> },

    #[error("The LLM request timed out.")]
    Timeout,

    #[error("Failed to connect to the upstream LLM provider.")]
    Connection,

    #[error("Upstream authentication/authorization failed.")]
    Authentication,

    #[error("Upstream model/deployment was not found.")]
    DeploymentNotFound,

    #[error("Upstream rejected the request.")]
    Rejected,

    #[error("Upstream provider encountered an internal error.")]
    UpstreamInternal,

    #[error("Upstream provider request failed.")]
    Failure,

    /// Construction-time misconfiguration. The detail is for logs only.
    #[error("invalid LLM configuration: {0}")]
    InvalidConfig(String),
}

impl LlmError {
    /// HTTP status the boundary should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            LlmError::RealCallsDisabled => 403,
            LlmError::RateLimited { .. } => 429,
            LlmError::Timeout => 504,
            LlmError::Connection
            | LlmError::Authentication
            | LlmError::DeploymentNotFound
            | LlmError::Rejected
            | LlmError::UpstreamInternal
            | LlmError::Failure => 502,
            LlmError::InvalidConfig(_) => 500,
        }
    }

    /// Stable machine code.
    pub fn code(&self) -> &'static str {
        match self {
            LlmError::RealCallsDisabled => "REAL_LLM_DISABLED",
            LlmError::RateLimited { .. } => "RATE_LIMIT_EXCEEDED",
            LlmError::Timeout => "LLM_TIMEOUT",
            LlmError::Connection
            | LlmError::Authentication
            | LlmError::DeploymentNotFound
            | LlmError::Rejected
            | LlmError::UpstreamInternal
            | LlmError::Failure => "LLM_PROVIDER_FAILURE",
            LlmError::InvalidConfig(_) => "INTERNAL_ERROR",
        }
    }

    pub fn retry_after_seconds(&self) -> Option<u64> {
        match self {
            LlmError::RateLimited {
                retry_after_seconds,
            } => *retry_after_seconds,
            _ => None,
        }
    }

    /// Human message safe to show to API callers.
    pub fn public_message(&self) -> String {
        match self {
            LlmError::InvalidConfig(_) => "The LLM provider is not configured.".to_string(),
            other => other.to_string(),
        }
    }

    pub fn normalize(&self) -> NormalizedError {
        NormalizedError::from(self)
    }
}

/// Transport-agnostic error record handed to the boundary layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedError {
    pub status_code: u16,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

impl From<&LlmError> for NormalizedError {
    fn from(err: &LlmError) -> Self {
        Self {
            status_code: err.status_code(),
            code: err.code().to_string(),
            message: err.public_message(),
            retry_after_seconds: err.retry_after_seconds(),
        }
    }
}

impl From<LlmError> for NormalizedError {
    fn from(err: LlmError) -> Self {
        NormalizedError::from(&err)
    }
}

/// Raw upstream failure, before classification.
#[derive(Debug)]
pub enum UpstreamFailure<'a> {
    /// The request never produced a response (or the body read broke off).
    Transport(&'a reqwest::Error),
    /// The upstream answered with a non-success status.
    Status {
        status: StatusCode,
        headers: &'a HeaderMap,
    },
    /// A success response whose body could not be understood.
    Decode(&'a str),
}

/// Map an upstream failure onto the taxonomy.
pub fn translate(failure: UpstreamFailure<'_>) -> LlmError {
    match failure {
        UpstreamFailure::Transport(err) if err.is_timeout() => LlmError::Timeout,
        UpstreamFailure::Transport(err) if err.is_connect() => LlmError::Connection,
        UpstreamFailure::Transport(_) => LlmError::Failure,
        UpstreamFailure::Status { status, headers } => match status.as_u16() {
            429 => LlmError::RateLimited {
                retry_after_seconds: retry_after_seconds(headers),
            },
            408 => LlmError::Timeout,
            401 | 403 => LlmError::Authentication,
            404 => LlmError::DeploymentNotFound,
            400 | 409 | 413 | 415 | 422 => LlmError::Rejected,
            500..=599 => LlmError::UpstreamInternal,
            _ => LlmError::Failure,
        },
        UpstreamFailure::Decode(_) => LlmError::Failure,
    }
}

/// Integer `Retry-After` value in seconds. HTTP-date forms are ignored.
pub fn retry_after_seconds(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}
