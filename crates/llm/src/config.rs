use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

use crate::LlmError;

/// API version used when `AZURE_OPENAI_API_VERSION` is unset or blank.
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-10-21";

/// Which provider variant the factory should build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmMode {
    Fake,
    Real,
}

/// Provider selection and upstream settings.
///
/// Field names match the lowercased environment variables they are read
/// from (`LLM_MODE`, `AZURE_OPENAI_ENDPOINT`, ...), so the struct can be fed
/// straight from an environment source.
///
/// # Example
/// ```
/// use llm::{build_provider, LlmConfig};
///
/// let cfg = LlmConfig {
///     fake_stream_delay_ms: 0,
///     ..Default::default()
/// };
/// let provider = build_provider(&cfg).unwrap();
/// assert_eq!(provider.name(), "fake");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    /// `"fake"` or `"real"`, case-insensitive.
    pub llm_mode: String,
    /// Safety switch; real upstream calls are refused unless this is set.
    #[serde(deserialize_with = "deserialize_truthy")]
    pub allow_real_llm: bool,
    pub azure_openai_endpoint: String,
    #[serde(skip_serializing)]
    pub azure_openai_api_key: String,
    pub azure_openai_api_version: String,
    pub azure_openai_deployment: String,
    /// Per-request upstream timeout, in (fractional) seconds.
    pub azure_openai_timeout_seconds: f64,
    /// Characters per streamed chunk in fake mode.
    pub fake_stream_chunk_size: usize,
    /// Pause between streamed chunks in fake mode. Zero or negative disables it.
    pub fake_stream_delay_ms: i64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            llm_mode: "fake".into(),
            allow_real_llm: false,
            azure_openai_endpoint: String::new(),
            azure_openai_api_key: String::new(),
            azure_openai_api_version: String::new(),
            azure_openai_deployment: String::new(),
            azure_openai_timeout_seconds: 30.0,
            fake_stream_chunk_size: 8,
            fake_stream_delay_ms: 120,
        }
    }
}

impl LlmConfig {
    pub fn mode(&self) -> Result<LlmMode, LlmError> {
        match self.llm_mode.trim().to_ascii_lowercase().as_str() {
            "fake" => Ok(LlmMode::Fake),
            "real" => Ok(LlmMode::Real),
            other => Err(LlmError::InvalidConfig(format!(
                "Invalid LLM_MODE={other:?}. Expected 'fake' or 'real'."
            ))),
        }
    }

    pub fn api_version(&self) -> &str {
        match self.azure_openai_api_version.trim() {
            "" => DEFAULT_AZURE_API_VERSION,
            version => version,
        }
    }

    pub fn timeout(&self) -> Duration {
        if self.azure_openai_timeout_seconds.is_finite() && self.azure_openai_timeout_seconds > 0.0
        {
            Duration::from_secs_f64(self.azure_openai_timeout_seconds)
        } else {
            Duration::from_secs(30)
        }
    }

    pub fn fake_stream_delay(&self) -> Duration {
        Duration::from_millis(self.fake_stream_delay_ms.max(0).unsigned_abs())
    }
}

/// Accepts booleans, integers and the usual truthy strings
/// (`1`, `true`, `yes`, `y`, `on`). Anything else is `false`.
fn deserialize_truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Int(value) => value != 0,
        Flag::Text(value) => is_truthy(&value),
    })
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}
