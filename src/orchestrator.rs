use futures::stream::{self, BoxStream, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use llm::{LlmError, LlmProvider, Style, TextStream};

use crate::contract::RephraseResult;
use crate::extract::{ModelOutputError, parse_rephrase_response};
use crate::prompt::{build_rephrase_prompt, build_single_style_prompt};

/// Failure of the synchronous path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RephraseError {
    #[error(transparent)]
    Provider(#[from] LlmError),
    #[error(transparent)]
    ModelOutput(#[from] ModelOutputError),
}

/// One streamed fragment, tagged with the style it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleDelta {
    pub style: Style,
    pub delta: String,
}

/// Deltas for all four styles, in [`Style::ALL`] order.
pub type DeltaStream = BoxStream<'static, Result<StyleDelta, LlmError>>;

/// Prompt, complete, extract. `text` is expected to be validated already.
pub async fn generate_rephrases(
    provider: &dyn LlmProvider,
    text: &str,
) -> Result<RephraseResult, RephraseError> {
    let started = Instant::now();
    let prompt = build_rephrase_prompt(text);
    let raw = provider.complete(&prompt).await?;

    let result = parse_rephrase_response(&raw).inspect_err(|err| {
        tracing::warn!(provider = provider.name(), error = %err, "model output rejected");
        tracing::debug!(raw_len = raw.len(), "rejected model output length");
    })?;

    tracing::debug!(
        provider = provider.name(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "rephrase completed"
    );
    Ok(result)
}

struct StreamState {
    provider: Arc<dyn LlmProvider>,
    text: String,
    pending: std::array::IntoIter<Style, 4>,
    current: Option<(Style, TextStream)>,
    finished: bool,
}

/// Stream every style one after another.
///
/// The provider is asked for style `k + 1` only once style `k` is
/// exhausted, and only if the consumer keeps polling. The stream ends right
/// after the first error; no later style is requested. Dropping the stream
/// is the cancellation signal.
pub fn generate_rephrases_stream(provider: Arc<dyn LlmProvider>, text: String) -> DeltaStream {
    let state = StreamState {
        provider,
        text,
        pending: Style::ALL.into_iter(),
        current: None,
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if state.finished {
                return None;
            }

            if let Some((style, fragments)) = state.current.as_mut() {
                let style = *style;
                match fragments.next().await {
                    Some(Ok(delta)) => return Some((Ok(StyleDelta { style, delta }), state)),
                    Some(Err(err)) => {
                        state.finished = true;
                        return Some((Err(err), state));
                    }
                    None => {
                        tracing::debug!(%style, "style stream exhausted");
                        state.current = None;
                    }
                }
                continue;
            }

            let style = state.pending.next()?;
            let prompt = build_single_style_prompt(&state.text, style);
            match state.provider.complete_stream(&prompt, style).await {
                Ok(fragments) => state.current = Some((style, fragments)),
                Err(err) => {
                    state.finished = true;
                    return Some((Err(err), state));
                }
            }
        }
    })
    .boxed()
}

/// Per-request buffer for the streaming path.
///
/// Owned by exactly one request; fed every forwarded delta and turned into
/// the final result once all styles are done.
#[derive(Debug, Default)]
pub struct RephraseAccumulator {
    parts: RephraseResult,
}

impl RephraseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, delta: &StyleDelta) {
        self.parts.slot_mut(delta.style).push_str(&delta.delta);
    }

    /// Trimmed per-style text.
    pub fn finish(self) -> RephraseResult {
        let mut result = self.parts;
        for style in Style::ALL {
            let trimmed = result.get(style).trim().to_string();
            result.set(style, trimmed);
        }
        result
    }
}
