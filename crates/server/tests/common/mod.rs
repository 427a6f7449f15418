//! Shared helpers for router-level tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use llm::{FakeProvider, LlmError, LlmProvider, Style, TextStream};
use server::{build_router, ProviderFactory, ServerConfig, ServerState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Fake-backed provider with scripted failures and call counters.
pub struct ScriptedProvider {
    pub complete_result: Option<Result<String, LlmError>>,
    pub fail_stream_on: Option<(Style, LlmError)>,
    pub complete_calls: AtomicUsize,
    pub stream_calls: AtomicUsize,
    inner: FakeProvider,
}

impl ScriptedProvider {
    pub fn fake() -> Self {
        Self {
            complete_result: None,
            fail_stream_on: None,
            complete_calls: AtomicUsize::new(0),
            stream_calls: AtomicUsize::new(0),
            inner: FakeProvider::new(8, Duration::ZERO),
        }
    }

    pub fn completing(result: Result<String, LlmError>) -> Self {
        Self {
            complete_result: Some(result),
            ..Self::fake()
        }
    }

    pub fn failing_stream_on(style: Style, err: LlmError) -> Self {
        Self {
            fail_stream_on: Some((style, err)),
            ..Self::fake()
        }
    }

    pub fn complete_calls(&self) -> usize {
        self.complete_calls.load(Ordering::SeqCst)
    }

    pub fn stream_calls(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        match &self.complete_result {
            Some(result) => result.clone(),
            None => self.inner.complete(prompt).await,
        }
    }

    async fn complete_stream(&self, prompt: &str, style: Style) -> Result<TextStream, LlmError> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_stream_on {
            Some((failing, err)) if *failing == style => Err(err.clone()),
            _ => self.inner.complete_stream(prompt, style).await,
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn factory_for(provider: Arc<ScriptedProvider>) -> ProviderFactory {
    Arc::new(move || {
        let provider: Arc<dyn LlmProvider> = provider.clone();
        Ok(provider)
    })
}

pub fn failing_factory(err: LlmError) -> ProviderFactory {
    Arc::new(move || -> Result<Arc<dyn LlmProvider>, LlmError> { Err(err.clone()) })
}

pub fn app_with_config(config: ServerConfig, factory: ProviderFactory) -> Router {
    let state = ServerState::with_provider_factory(config, factory);
    build_router(Arc::new(state)).expect("config builds a router")
}

pub fn app_with(factory: ProviderFactory) -> Router {
    app_with_config(ServerConfig::default(), factory)
}

/// Factory that always hands out `provider`.
pub fn factory_of(provider: impl LlmProvider + 'static) -> ProviderFactory {
    let provider: Arc<dyn LlmProvider> = Arc::new(provider);
    Arc::new(move || -> Result<Arc<dyn LlmProvider>, LlmError> { Ok(provider.clone()) })
}

/// `{"text": "aaa..."}` well over the default 64 KB body limit.
pub fn oversized_body() -> String {
    serde_json::json!({ "text": "a".repeat(70_000) }).to_string()
}

pub fn app_for(provider: Arc<ScriptedProvider>) -> Router {
    app_with(factory_for(provider))
}

pub fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

/// `(event name, JSON payload)` for every named event in an SSE body.
pub fn parse_events(raw: &str) -> Vec<(String, serde_json::Value)> {
    raw.split("\n\n")
        .filter_map(|block| {
            let mut name = None;
            let mut data = None;
            for line in block.lines() {
                if let Some(value) = line.strip_prefix("event:") {
                    name = Some(value.trim_start().to_string());
                } else if let Some(value) = line.strip_prefix("data:") {
                    data = Some(value.trim_start().to_string());
                }
            }
            Some((name?, serde_json::from_str(&data?).ok()?))
        })
        .collect()
}
