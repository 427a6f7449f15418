use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the four rewrite styles the service produces.
///
/// The declaration order is the delivery order on the streaming path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Professional,
    Casual,
    Polite,
    Social,
}

impl Style {
    /// Every style, in the fixed streaming order.
    pub const ALL: [Style; 4] = [
        Style::Professional,
        Style::Casual,
        Style::Polite,
        Style::Social,
    ];

    /// Wire name, also the JSON key in the response contract.
    pub fn as_str(self) -> &'static str {
        match self {
            Style::Professional => "professional",
            Style::Casual => "casual",
            Style::Polite => "polite",
            Style::Social => "social",
        }
    }

    /// Human label used when phrasing prompts.
    pub fn label(self) -> &'static str {
        match self {
            Style::Social => "social media",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
