use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;

use crate::azure::AzureOpenAiProvider;
use crate::config::{LlmConfig, LlmMode};
use crate::fake::FakeProvider;
use crate::{LlmError, Style};

/// Lazy, finite, non-restartable sequence of text fragments.
pub type TextStream = BoxStream<'static, Result<String, LlmError>>;

/// Text-completion capability backed by some language model.
///
/// Implementations must be Send + Sync so a single instance can be shared
/// across request handlers behind an `Arc`.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Whole-response completion. Returns the raw model text.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Streamed completion for a single style.
    ///
    /// `style` names the rewrite the prompt asks for, so implementations
    /// never have to recover it from the prompt text.
    async fn complete_stream(&self, prompt: &str, style: Style) -> Result<TextStream, LlmError>;

    /// Short provider name for logs and readiness output.
    fn name(&self) -> &str;
}

/// Select and construct a provider from configuration.
///
/// The safety switch is checked before any real provider is constructed,
/// so a disabled configuration never touches the network.
pub fn build_provider(cfg: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match cfg.mode()? {
        LlmMode::Fake => Ok(Arc::new(FakeProvider::from_config(cfg))),
        LlmMode::Real => {
            if !cfg.allow_real_llm {
                tracing::warn!("LLM_MODE=real requested but ALLOW_REAL_LLM is not enabled");
                return Err(LlmError::RealCallsDisabled);
            }
            Ok(Arc::new(AzureOpenAiProvider::new(cfg)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_mode_builds_fake_provider() {
        let provider = build_provider(&LlmConfig::default()).unwrap();
        assert_eq!(provider.name(), "fake");
    }

    #[test]
    fn real_mode_without_switch_is_disabled() {
        let cfg = LlmConfig {
            llm_mode: "real".into(),
            azure_openai_endpoint: "https://example.openai.azure.com".into(),
            azure_openai_api_key: "key".into(),
            azure_openai_deployment: "gpt".into(),
            ..Default::default()
        };
        let err = build_provider(&cfg).err().unwrap();
        assert_eq!(err, LlmError::RealCallsDisabled);
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn real_mode_with_switch_requires_settings() {
        let cfg = LlmConfig {
            llm_mode: "real".into(),
            allow_real_llm: true,
            ..Default::default()
        };
        let err = build_provider(&cfg).err().unwrap();
        assert!(matches!(err, LlmError::InvalidConfig(msg) if msg.contains("AZURE_OPENAI_ENDPOINT")));
    }

    #[test]
    fn real_mode_with_switch_and_settings_builds_azure() {
        let cfg = LlmConfig {
            llm_mode: "real".into(),
            allow_real_llm: true,
            azure_openai_endpoint: "https://example.openai.azure.com".into(),
            azure_openai_api_key: "key".into(),
            azure_openai_deployment: "gpt".into(),
            ..Default::default()
        };
        let provider = build_provider(&cfg).unwrap();
        assert_eq!(provider.name(), "azure-openai");
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let cfg = LlmConfig {
            llm_mode: "sandbox".into(),
            ..Default::default()
        };
        assert!(matches!(
            build_provider(&cfg),
            Err(LlmError::InvalidConfig(_))
        ));
    }
}
