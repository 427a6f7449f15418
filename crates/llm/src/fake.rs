use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::json;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::provider::{LlmProvider, TextStream};
use crate::{LlmError, Style};

/// Deterministic offline provider.
///
/// `complete` returns a contract-shaped JSON object wrapped in a little chatter
/// (the extractor has to dig it out, just like with a real model), and
/// `complete_stream` replays the canned text for the requested style in
/// fixed-size chunks. Never touches the network.
#[derive(Debug, Clone)]
pub struct FakeProvider {
    chunk_size: usize,
    delay: Duration,
}

impl FakeProvider {
    pub fn new(chunk_size: usize, delay: Duration) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            delay,
        }
    }

    pub fn from_config(cfg: &LlmConfig) -> Self {
        Self::new(cfg.fake_stream_chunk_size, cfg.fake_stream_delay())
    }

    /// Canned rewrite for one style.
    pub fn canned_text(style: Style) -> &'static str {
        match style {
            Style::Professional => "Please review the attached document.",
            Style::Casual => "Hey, can you take a look at this?",
            Style::Polite => "Could you please review the attached document?",
            Style::Social => "Hey everyone, check this out!",
        }
    }

    fn chunks(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        chars
            .chunks(self.chunk_size)
            .map(|chunk| chunk.iter().collect())
            .collect()
    }
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default())
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        let payload = json!({
            "professional": Self::canned_text(Style::Professional),
            "casual": Self::canned_text(Style::Casual),
            "polite": Self::canned_text(Style::Polite),
            "social": Self::canned_text(Style::Social),
        });
        Ok(format!("Sure! Here is the JSON:\n{payload}"))
    }

    async fn complete_stream(&self, _prompt: &str, style: Style) -> Result<TextStream, LlmError> {
        let delay = self.delay;
        let chunks = self.chunks(Self::canned_text(style));

        let stream =
            stream::iter(chunks.into_iter().enumerate()).then(move |(idx, chunk)| async move {
                if idx > 0 && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok::<_, LlmError>(chunk)
            });

        Ok(stream.boxed())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn complete_wraps_json_in_prose() {
        let raw = FakeProvider::default().complete("anything").await.unwrap();
        assert!(raw.starts_with("Sure! Here is the JSON:"));
        let start = raw.find('{').unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw[start..]).unwrap();
        assert_eq!(
            value["polite"],
            "Could you please review the attached document?"
        );
    }

    #[tokio::test]
    async fn stream_chunks_requested_style() {
        let provider = FakeProvider::new(8, Duration::ZERO);
        let chunks: Vec<String> = provider
            .complete_stream("prompt", Style::Casual)
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        assert!(chunks.iter().all(|c| c.chars().count() <= 8));
        assert_eq!(chunks.first().map(String::as_str), Some("Hey, can"));
        assert_eq!(chunks.concat(), "Hey, can you take a look at this?");
    }

    #[tokio::test]
    async fn zero_chunk_size_is_clamped() {
        let provider = FakeProvider::new(0, Duration::ZERO);
        let chunks: Vec<String> = provider
            .complete_stream("prompt", Style::Social)
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(chunks.len(), "Hey everyone, check this out!".chars().count());
    }

    #[tokio::test(start_paused = true)]
    async fn delay_applies_between_chunks() {
        let provider = FakeProvider::new(10, Duration::from_millis(100));
        let started = tokio::time::Instant::now();
        let chunks: Vec<String> = provider
            .complete_stream("prompt", Style::Professional)
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        // 36 chars / 10 per chunk = 4 chunks, 3 pauses
        assert_eq!(chunks.len(), 4);
        assert_eq!(started.elapsed(), Duration::from_millis(300));
    }

    #[test]
    fn name_is_fake() {
        assert_eq!(FakeProvider::default().name(), "fake");
    }
}
