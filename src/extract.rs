//! Recover a [`RephraseResult`] from raw model text.
//!
//! Models wrap JSON in chatter and code fences no matter what the prompt
//! says, so the extractor is deliberately forgiving about the surroundings
//! and strict about the object itself:
//!
//! 1. strip one pair of fence lines (```` ```json ```` ... ```` ``` ````),
//! 2. take the span from the first `{` to the last `}`,
//! 3. parse it as JSON,
//! 4. validate it against [`ResponseContract`].
//!
//! Step 2 is greedy, not a balanced-brace scan. Prose containing its own
//! braces around the object will produce a span that fails to parse.

use serde_json::Value;
use thiserror::Error;

use crate::contract::{ContractViolation, RephraseResult, ResponseContract};

/// Model output that could not be turned into a [`RephraseResult`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelOutputError {
    #[error("Empty model output.")]
    Empty,

    #[error("No JSON object found in model output.")]
    NoJsonObject,

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("JSON did not match the frozen response contract.")]
    ContractMismatch(Vec<ContractViolation>),
}

/// Parse and validate raw model text.
pub fn parse_rephrase_response(raw: &str) -> Result<RephraseResult, ModelOutputError> {
    if raw.trim().is_empty() {
        return Err(ModelOutputError::Empty);
    }

    let cleaned = strip_code_fences(raw);
    let span = json_object_span(&cleaned)?;

    let value: Value =
        serde_json::from_str(span).map_err(|e| ModelOutputError::InvalidJson(e.to_string()))?;

    ResponseContract
        .validate(&value)
        .map_err(ModelOutputError::ContractMismatch)
}

/// Drop a leading fence line (with or without a language tag) and a
/// trailing fence line. Text that doesn't open with a fence is only trimmed.
pub(crate) fn strip_code_fences(text: &str) -> String {
    let text = text.trim();
    if !text.starts_with("```") {
        return text.to_string();
    }

    let mut lines: Vec<&str> = text.lines().collect();
    if lines.len() >= 2 {
        lines.remove(0);
    }
    if lines
        .last()
        .is_some_and(|line| line.trim().starts_with("```"))
    {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

fn json_object_span(text: &str) -> Result<&str, ModelOutputError> {
    let text = text.trim();
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => Ok(&text[start..=end]),
        _ => Err(ModelOutputError::NoJsonObject),
    }
}
