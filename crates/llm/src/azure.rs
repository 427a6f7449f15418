use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use crate::config::LlmConfig;
use crate::error::{translate, UpstreamFailure};
use crate::provider::{LlmProvider, TextStream};
use crate::{LlmError, Style};

// Shared HTTP client; the per-request timeout is applied on each call
static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(32)
        .build()
        .expect("Failed to build HTTP client")
});

/// Provider backed by an Azure OpenAI chat-completions deployment.
#[derive(Clone)]
pub struct AzureOpenAiProvider {
    url: String,
    api_key: String,
    timeout: Duration,
}

impl fmt::Debug for AzureOpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureOpenAiProvider")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AzureOpenAiProvider {
    /// Validate settings and build the provider. Performs no I/O.
    pub fn new(cfg: &LlmConfig) -> Result<Self, LlmError> {
        let endpoint = required(&cfg.azure_openai_endpoint, "AZURE_OPENAI_ENDPOINT")?;
        let api_key = required(&cfg.azure_openai_api_key, "AZURE_OPENAI_API_KEY")?;
        let api_version = required(cfg.api_version(), "AZURE_OPENAI_API_VERSION")?;
        let deployment = required(&cfg.azure_openai_deployment, "AZURE_OPENAI_DEPLOYMENT")?;

        let url = format!(
            "{}/openai/deployments/{deployment}/chat/completions?api-version={api_version}",
            endpoint.trim_end_matches('/'),
        );

        Ok(Self {
            url,
            api_key: api_key.to_string(),
            timeout: cfg.timeout(),
        })
    }

    async fn send(&self, payload: Value) -> Result<reqwest::Response, LlmError> {
        let response = HTTP_CLIENT
            .post(&self.url)
            .header("api-key", &self.api_key)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| translate(UpstreamFailure::Transport(&e)))?;

        let status = response.status();
        if !status.is_success() {
            let err = translate(UpstreamFailure::Status {
                status,
                headers: response.headers(),
            });
            tracing::warn!(status = %status, code = err.code(), "upstream LLM call failed");
            return Err(err);
        }

        Ok(response)
    }
}

fn required<'a>(value: &'a str, name: &str) -> Result<&'a str, LlmError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(LlmError::InvalidConfig(format!("{name} is not set.")));
    }
    Ok(value)
}

fn chat_payload(prompt: &str, stream: bool) -> Value {
    let mut payload = json!({
        "messages": [{ "role": "user", "content": prompt }],
    });
    if stream {
        payload["stream"] = Value::Bool(true);
    }
    payload
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

#[async_trait]
impl LlmProvider for AzureOpenAiProvider {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let started = Instant::now();
        let response = self.send(chat_payload(prompt, false)).await?;

        let body: ChatCompletion = response.json().await.map_err(|e| {
            if e.is_decode() {
                translate(UpstreamFailure::Decode("chat completion body"))
            } else {
                translate(UpstreamFailure::Transport(&e))
            }
        })?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| translate(UpstreamFailure::Decode("no choices in completion")))?;

        tracing::debug!(
            provider = "azure-openai",
            elapsed_ms = started.elapsed().as_millis() as u64,
            "completion received"
        );

        Ok(choice.message.content.unwrap_or_default())
    }

    async fn complete_stream(&self, prompt: &str, style: Style) -> Result<TextStream, LlmError> {
        tracing::debug!(provider = "azure-openai", %style, "opening completion stream");
        let response = self.send(chat_payload(prompt, true)).await?;
        Ok(decode_event_stream(response.bytes_stream().boxed()))
    }

    fn name(&self) -> &str {
        "azure-openai"
    }
}

/// One decoded `data:` line of a chat-completions event stream.
#[derive(Debug, PartialEq)]
enum SseData {
    Fragment(String),
    Done,
    Skip,
}

fn decode_data_line(line: &str) -> Result<SseData, LlmError> {
    let Some(data) = line.strip_prefix("data:") else {
        // comments, `event:` lines, blank separators
        return Ok(SseData::Skip);
    };
    let data = data.trim();
    if data.is_empty() {
        return Ok(SseData::Skip);
    }
    if data == "[DONE]" {
        return Ok(SseData::Done);
    }

    let chunk: ChatChunk = serde_json::from_str(data)
        .map_err(|_| translate(UpstreamFailure::Decode("stream chunk")))?;
    if chunk.error.is_some() {
        return Err(LlmError::Failure);
    }

    let fragment = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta)
        .and_then(|delta| delta.content)
        .unwrap_or_default();

    if fragment.is_empty() {
        Ok(SseData::Skip)
    } else {
        Ok(SseData::Fragment(fragment))
    }
}

/// Splits a byte stream into complete lines, tolerating chunk boundaries
/// that fall inside a line or a multi-byte character.
#[derive(Debug, Default)]
struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(
                String::from_utf8_lossy(&line)
                    .trim_end_matches(['\r', '\n'])
                    .to_string(),
            );
        }
        lines
    }

    fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(String::from_utf8_lossy(&rest).trim_end().to_string())
    }
}

struct DecodeState {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    lines: LineBuffer,
    ready: VecDeque<String>,
    failure: Option<LlmError>,
    done: bool,
}

impl DecodeState {
    fn absorb(&mut self, lines: Vec<String>) {
        for line in lines {
            match decode_data_line(&line) {
                Ok(SseData::Fragment(text)) => self.ready.push_back(text),
                Ok(SseData::Skip) => {}
                Ok(SseData::Done) => {
                    self.done = true;
                    break;
                }
                Err(err) => {
                    self.failure = Some(err);
                    self.done = true;
                    break;
                }
            }
        }
    }
}

fn decode_event_stream(body: BoxStream<'static, reqwest::Result<Bytes>>) -> TextStream {
    let state = DecodeState {
        body,
        lines: LineBuffer::default(),
        ready: VecDeque::new(),
        failure: None,
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            // fragments decoded before a failure still go out first
            if let Some(fragment) = state.ready.pop_front() {
                return Some((Ok(fragment), state));
            }
            if let Some(err) = state.failure.take() {
                return Some((Err(err), state));
            }
            if state.done {
                return None;
            }
            match state.body.next().await {
                Some(Ok(bytes)) => {
                    let lines = state.lines.push(&bytes);
                    state.absorb(lines);
                }
                Some(Err(e)) => {
                    state.failure = Some(translate(UpstreamFailure::Transport(&e)));
                    state.done = true;
                }
                None => {
                    let tail: Vec<String> = state.lines.finish().into_iter().collect();
                    state.absorb(tail);
                    state.done = true;
                }
            }
        }
    })
    .boxed()
}
