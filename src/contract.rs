//! The frozen response contract.
//!
//! Every successful rephrase, synchronous or streamed, ends up as a
//! [`RephraseResult`]: exactly four string fields, nothing else. Untrusted
//! JSON is checked by [`ResponseContract::validate`], which reports every
//! problem it finds instead of stopping at the first one.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

use llm::Style;

/// Four stylistic rewrites of one input text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RephraseResult {
    pub professional: String,
    pub casual: String,
    pub polite: String,
    pub social: String,
}

impl RephraseResult {
    pub fn get(&self, style: Style) -> &str {
        match style {
            Style::Professional => &self.professional,
            Style::Casual => &self.casual,
            Style::Polite => &self.polite,
            Style::Social => &self.social,
        }
    }

    pub(crate) fn slot_mut(&mut self, style: Style) -> &mut String {
        match style {
            Style::Professional => &mut self.professional,
            Style::Casual => &mut self.casual,
            Style::Polite => &mut self.polite,
            Style::Social => &mut self.social,
        }
    }

    pub(crate) fn set(&mut self, style: Style, text: String) {
        *self.slot_mut(style) = text;
    }
}

/// One way a JSON value fails the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    NotAnObject { found: &'static str },
    MissingKey(Style),
    UnexpectedKey(String),
    NotAString { key: Style, found: &'static str },
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractViolation::NotAnObject { found } => {
                write!(f, "expected a JSON object, found {found}")
            }
            ContractViolation::MissingKey(style) => write!(f, "missing key `{style}`"),
            ContractViolation::UnexpectedKey(key) => write!(f, "unexpected key `{key}`"),
            ContractViolation::NotAString { key, found } => {
                write!(f, "`{key}` must be a string, found {found}")
            }
        }
    }
}

/// Schema object for [`RephraseResult`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseContract;

impl ResponseContract {
    /// Check `value` against the contract.
    ///
    /// Values are taken as-is (no trimming); an empty string is a valid
    /// rewrite as far as the shape is concerned.
    pub fn validate(&self, value: &Value) -> Result<RephraseResult, Vec<ContractViolation>> {
        let Some(object) = value.as_object() else {
            return Err(vec![ContractViolation::NotAnObject {
                found: json_kind(value),
            }]);
        };

        let mut violations: Vec<ContractViolation> = object
            .keys()
            .filter(|key| !Style::ALL.iter().any(|style| style.as_str() == key.as_str()))
            .map(|key| ContractViolation::UnexpectedKey(key.clone()))
            .collect();

        let mut result = RephraseResult::default();
        for style in Style::ALL {
            match object.get(style.as_str()) {
                None => violations.push(ContractViolation::MissingKey(style)),
                Some(Value::String(text)) => result.set(style, text.clone()),
                Some(other) => violations.push(ContractViolation::NotAString {
                    key: style,
                    found: json_kind(other),
                }),
            }
        }

        if violations.is_empty() {
            Ok(result)
        } else {
            Err(violations)
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
