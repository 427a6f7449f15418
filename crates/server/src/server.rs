//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration with all API endpoints
//! - Middleware stack (request IDs, logging, CORS, compression, timeouts)
//! - Graceful shutdown handling

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::middleware::{log_requests, request_id};
use crate::routes::{api_info, not_found};
use crate::routes::{health, rephrase, stream};
use crate::state::ServerState;
use crate::telemetry::{init_tracing, install_metrics_recorder};
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// CORS layer from the configured allow-lists
fn cors_layer(config: &ServerConfig) -> anyhow::Result<CorsLayer> {
    config.validate()?;
    let origins = config.cors_origins();
    let allow_origin = if origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        let values = origins
            .iter()
            .map(|origin| HeaderValue::from_str(origin))
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(values)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(config.cors_methods()?)
        .allow_headers(config.cors_headers()?)
        .allow_credentials(config.cors_allow_credentials))
}

/// Turn a handler panic into the generic `500 INTERNAL_ERROR` body
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError::Internal(format!("handler panicked: {detail}")).into_response()
}

/// Build the Axum router with all routes and middleware
///
/// `POST /rephrase` enforces `timeout_secs` itself so that expiry comes
/// back as `504 LLM_TIMEOUT`; the streaming route is bounded by the
/// per-call upstream timeout instead, since a healthy stream can outlive
/// any fixed deadline.
///
/// Middleware stack, outermost first:
/// 1. Tracing
/// 2. Request ID tracking
/// 3. Request logging
/// 4. CORS
/// 5. Compression (skips `text/event-stream`)
/// 6. Body size limit
/// 7. Panic recovery
pub fn build_router(state: Arc<ServerState>) -> anyhow::Result<Router> {
    let cors = cors_layer(&state.config)?;

    Ok(Router::new()
        .route("/", get(api_info))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics))
        .route("/rephrase", post(rephrase::rephrase))
        .route("/rephrase/stream", post(stream::rephrase_stream))
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(DefaultBodyLimit::max(state.config.max_body_size()))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Start the rephrase HTTP server
///
/// Initializes logging and (optionally) the Prometheus recorder, then
/// serves until SIGTERM or Ctrl+C.
///
/// # Example
///
/// ```rust,no_run
/// use server::ServerConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ServerConfig::load()?;
///     server::start_server(config).await?;
///     Ok(())
/// }
/// ```
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    init_tracing(&config.log_level);

    let mut state = ServerState::new(config.clone());
    if config.metrics_enabled {
        state = state.with_metrics(install_metrics_recorder()?);
    }

    let app = build_router(Arc::new(state))?;
    let addr: SocketAddr = config.socket_addr()?;

    tracing::info!(
        environment = %config.environment,
        "Starting rephrase server on {}",
        addr
    );
    tracing::info!(
        "Timeout: {}s, Max body: {}KB",
        config.timeout_secs,
        config.max_body_size_kb
    );
    tracing::info!(
        "CORS origins: {:?}, credentials: {}, Metrics: {}",
        config.cors_origins(),
        config.cors_allow_credentials,
        config.metrics_enabled
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
