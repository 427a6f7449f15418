//! Pre-flight request checks.
//!
//! Runs before any provider work on both the synchronous and the streaming
//! path. Nothing here allocates a prompt or touches the network.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Longest accepted input, in characters, after trimming.
pub const MAX_TEXT_CHARS: usize = 5000;

const TEXT_FIELD: &str = "text";
const BODY_FIELD: &str = "body";

/// Machine token describing what is wrong with a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Required,
    MinLength,
    MaxLength,
    Type,
    MalformedJson,
}

impl IssueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueKind::Required => "required",
            IssueKind::MinLength => "min_length",
            IssueKind::MaxLength => "max_length",
            IssueKind::Type => "type",
            IssueKind::MalformedJson => "malformed_json",
        }
    }
}

/// One offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub field: String,
    pub issue: IssueKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ValidationIssue {
    pub fn required(field: &str) -> Self {
        Self::new(field, IssueKind::Required, "This field is required.".into())
    }

    pub fn min_length(field: &str, min: usize) -> Self {
        Self::new(
            field,
            IssueKind::MinLength,
            format!("Must be at least {min} character(s)."),
        )
    }

    pub fn max_length(field: &str, max: usize) -> Self {
        Self::new(
            field,
            IssueKind::MaxLength,
            format!("Must be at most {max} character(s)."),
        )
    }

    pub fn wrong_type(field: &str) -> Self {
        Self::new(field, IssueKind::Type, "Wrong type for this field.".into())
    }

    pub fn malformed_json() -> Self {
        Self::new(
            BODY_FIELD,
            IssueKind::MalformedJson,
            "Request body must be valid JSON.".into(),
        )
    }

    fn new(field: &str, issue: IssueKind, hint: String) -> Self {
        Self {
            field: field.to_string(),
            issue,
            hint: Some(hint),
        }
    }
}

/// Request rejected before any provider call.
///
/// Always carries at least one issue; the first one drives the summary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", summary(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn single(issue: ValidationIssue) -> Self {
        Self {
            issues: vec![issue],
        }
    }

    /// `Invalid request: <field> (<issue>)` for the first issue.
    pub fn message(&self) -> String {
        summary(&self.issues)
    }
}

fn summary(issues: &[ValidationIssue]) -> String {
    match issues.first() {
        Some(first) => format!("Invalid request: {} ({})", first.field, first.issue.as_str()),
        None => "Invalid request.".to_string(),
    }
}

/// Trim `text` and check its length. Returns the trimmed text.
pub fn validate(text: &str) -> Result<String, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::single(ValidationIssue::min_length(
            TEXT_FIELD, 1,
        )));
    }
    if trimmed.chars().count() > MAX_TEXT_CHARS {
        return Err(ValidationError::single(ValidationIssue::max_length(
            TEXT_FIELD,
            MAX_TEXT_CHARS,
        )));
    }
    Ok(trimmed.to_string())
}

/// Parse a raw `{"text": ...}` request body and validate the text.
///
/// Every way the body can be wrong maps to a [`ValidationError`], so
/// callers never need a separate "bad request" path.
pub fn validate_body(body: &[u8]) -> Result<String, ValidationError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|_| ValidationError::single(ValidationIssue::malformed_json()))?;

    let Value::Object(fields) = value else {
        return Err(ValidationError::single(ValidationIssue::wrong_type(
            BODY_FIELD,
        )));
    };

    match fields.get(TEXT_FIELD) {
        None | Some(Value::Null) => Err(ValidationError::single(ValidationIssue::required(
            TEXT_FIELD,
        ))),
        Some(Value::String(text)) => validate(text),
        Some(_) => Err(ValidationError::single(ValidationIssue::wrong_type(
            TEXT_FIELD,
        ))),
    }
}
