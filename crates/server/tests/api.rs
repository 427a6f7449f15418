//! Router-level tests for the JSON endpoints.

mod common;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use llm::{LlmError, LlmProvider, Style, TextStream};
use serde_json::{json, Value};
use server::ServerConfig;
use std::sync::Arc;
use std::time::Duration;

/// Panics on every call.
struct PanickingProvider;

#[async_trait]
impl LlmProvider for PanickingProvider {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        panic!("provider exploded")
    }

    async fn complete_stream(&self, _prompt: &str, _style: Style) -> Result<TextStream, LlmError> {
        panic!("provider exploded")
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

/// Never answers within any reasonable deadline.
struct StalledProvider;

#[async_trait]
impl LlmProvider for StalledProvider {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(String::new())
    }

    async fn complete_stream(&self, _prompt: &str, _style: Style) -> Result<TextStream, LlmError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(LlmError::Timeout)
    }

    fn name(&self) -> &str {
        "stalled"
    }
}

fn assert_contract_shape(body: &Value) {
    let object = body.as_object().expect("response is an object");
    assert_eq!(object.len(), 4);
    for style in Style::ALL {
        assert!(object[style.as_str()].is_string(), "{style} is a string");
    }
}

fn assert_validation_error(body: &Value) {
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["message"].is_string());
    let details = body["details"].as_array().expect("details is a list");
    assert!(!details.is_empty());
    for item in details {
        assert!(item["field"].is_string());
        assert!(item["issue"].is_string());
    }
}

#[tokio::test]
async fn rephrase_returns_frozen_contract_shape() {
    let provider = Arc::new(ScriptedProvider::fake());
    let response = send(
        app_for(provider.clone()),
        post_json("/rephrase", json!({"text": "Hello world"}).to_string()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_contract_shape(&body);
    assert_eq!(body["polite"], "Could you please review the attached document?");
    assert_eq!(provider.complete_calls(), 1);
}

#[tokio::test]
async fn invalid_bodies_are_validation_errors_without_provider_calls() {
    let too_long = "a".repeat(5001);
    let cases: Vec<(String, &str, &str)> = vec![
        (json!({"text": ""}).to_string(), "text", "min_length"),
        (json!({"text": "   \n"}).to_string(), "text", "min_length"),
        (json!({}).to_string(), "text", "required"),
        (json!({"text": null}).to_string(), "text", "required"),
        (json!({"text": 5}).to_string(), "text", "type"),
        (json!({"text": too_long}).to_string(), "text", "max_length"),
        ("[1, 2]".to_string(), "body", "type"),
        ("{\"text\": ".to_string(), "body", "malformed_json"),
    ];

    for (raw, field, issue) in cases {
        let provider = Arc::new(ScriptedProvider::fake());
        let response = send(app_for(provider.clone()), post_json("/rephrase", raw.clone())).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {raw}");
        let body = body_json(response).await;
        assert_validation_error(&body);
        assert_eq!(body["details"][0]["field"], field, "body: {raw}");
        assert_eq!(body["details"][0]["issue"], issue, "body: {raw}");
        assert_eq!(
            body["message"],
            format!("Invalid request: {field} ({issue})")
        );
        assert_eq!(provider.complete_calls(), 0);
    }
}

#[tokio::test]
async fn oversized_body_is_max_length_validation_error() {
    let provider = Arc::new(ScriptedProvider::fake());
    let response = send(
        app_for(provider.clone()),
        post_json("/rephrase", oversized_body()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_validation_error(&body);
    assert_eq!(body["details"][0]["field"], "text");
    assert_eq!(body["details"][0]["issue"], "max_length");
    assert_eq!(body["message"], "Invalid request: text (max_length)");
    assert_eq!(provider.complete_calls(), 0);
}

#[tokio::test]
async fn handler_panic_is_generic_internal_error() {
    let response = send(
        app_with(factory_of(PanickingProvider)),
        post_json("/rephrase", json!({"text": "hello"}).to_string()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["code"], "INTERNAL_ERROR");
    assert_eq!(body["message"], "Internal server error.");
    assert_eq!(body["details"], json!([]));
    assert!(!body.to_string().contains("exploded"));
}

#[tokio::test(start_paused = true)]
async fn slow_rephrase_times_out_as_llm_timeout() {
    let config = ServerConfig {
        timeout_secs: 1,
        ..Default::default()
    };
    let response = send(
        app_with_config(config, factory_of(StalledProvider)),
        post_json("/rephrase", json!({"text": "hello"}).to_string()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body = body_json(response).await;
    assert_eq!(body["code"], "LLM_TIMEOUT");
    assert_eq!(body["message"], "The LLM request timed out.");
    assert_eq!(body["details"], json!([]));
}

#[tokio::test]
async fn rate_limit_maps_to_429_with_retry_after() {
    let provider = Arc::new(ScriptedProvider::completing(Err(LlmError::RateLimited {
        retry_after_seconds: Some(10),
    })));
    let response = send(
        app_for(provider),
        post_json("/rephrase", json!({"text": "hello"}).to_string()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["retry-after"], "10");
    let body = body_json(response).await;
    assert_eq!(body["code"], "RATE_LIMIT_EXCEEDED");
    assert_eq!(body["details"], json!([]));
}

#[tokio::test]
async fn timeout_maps_to_504() {
    let provider = Arc::new(ScriptedProvider::completing(Err(LlmError::Timeout)));
    let response = send(
        app_for(provider),
        post_json("/rephrase", json!({"text": "hello"}).to_string()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert!(response.headers().get("retry-after").is_none());
    let body = body_json(response).await;
    assert_eq!(body["code"], "LLM_TIMEOUT");
}

#[tokio::test]
async fn upstream_failures_map_to_502() {
    for err in [
        LlmError::Connection,
        LlmError::Authentication,
        LlmError::DeploymentNotFound,
        LlmError::Rejected,
        LlmError::UpstreamInternal,
        LlmError::Failure,
    ] {
        let message = err.to_string();
        let provider = Arc::new(ScriptedProvider::completing(Err(err)));
        let response = send(
            app_for(provider),
            post_json("/rephrase", json!({"text": "hello"}).to_string()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["code"], "LLM_PROVIDER_FAILURE");
        assert_eq!(body["message"], message);
    }
}

#[tokio::test]
async fn non_json_model_output_is_internal_error() {
    let provider = Arc::new(ScriptedProvider::completing(Ok("not json at all".into())));
    let response = send(
        app_for(provider),
        post_json("/rephrase", json!({"text": "hello"}).to_string()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["code"], "INTERNAL_ERROR");
    assert_eq!(body["details"], json!([]));
    assert!(!body.to_string().contains("not json at all"));
}

#[tokio::test]
async fn contract_violations_are_internal_errors() {
    let provider = Arc::new(ScriptedProvider::completing(Ok(
        r#"{"professional":"a","casual":"b","polite":"c","social":"d","tone":"x"}"#.into(),
    )));
    let response = send(
        app_for(provider),
        post_json("/rephrase", json!({"text": "hello"}).to_string()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["code"], "INTERNAL_ERROR");
}

#[tokio::test]
async fn disabled_real_mode_is_forbidden() {
    let response = send(
        app_with(failing_factory(LlmError::RealCallsDisabled)),
        post_json("/rephrase", json!({"text": "hello"}).to_string()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "REAL_LLM_DISABLED");
}

#[tokio::test]
async fn health_and_readiness() {
    let app = app_for(Arc::new(ScriptedProvider::fake()));

    let response = send(
        app.clone(),
        Request::get("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");

    let response = send(app, Request::get("/ready").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["provider"], "scripted");
}

#[tokio::test]
async fn readiness_fails_when_no_provider_can_be_built() {
    let app = app_with(failing_factory(LlmError::InvalidConfig(
        "AZURE_OPENAI_ENDPOINT is not set.".into(),
    )));
    let response = send(app, Request::get("/ready").body(Body::empty()).unwrap()).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["status"], "unavailable");
    assert_eq!(body["code"], "INTERNAL_ERROR");
    assert!(!body.to_string().contains("AZURE"));
}

#[tokio::test]
async fn metrics_without_recorder_is_empty() {
    let app = app_for(Arc::new(ScriptedProvider::fake()));
    let response = send(app, Request::get("/metrics").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.is_empty());
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = app_for(Arc::new(ScriptedProvider::fake()));
    let response = send(app, Request::get("/nope").body(Body::empty()).unwrap()).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["details"], json!([]));
}

#[tokio::test]
async fn request_id_is_echoed_or_generated() {
    let app = app_for(Arc::new(ScriptedProvider::fake()));

    let response = send(
        app.clone(),
        Request::get("/health")
            .header("x-request-id", "req-123")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.headers()["x-request-id"], "req-123");

    let response = send(app, Request::get("/health").body(Body::empty()).unwrap()).await;
    let generated = response.headers()["x-request-id"].to_str().unwrap();
    assert_eq!(generated.len(), 36);
}

#[tokio::test]
async fn cors_allows_configured_origin_only() {
    let app = app_for(Arc::new(ScriptedProvider::fake()));
    let preflight = |origin: &str| {
        Request::builder()
            .method("OPTIONS")
            .uri("/rephrase")
            .header("origin", origin)
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .body(Body::empty())
            .unwrap()
    };

    let response = send(app.clone(), preflight("http://localhost:5173")).await;
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:5173"
    );

    let response = send(app, preflight("https://evil.example.com")).await;
    assert!(response
        .headers()
        .get("access-control-allow-origin")
        .is_none());
}
