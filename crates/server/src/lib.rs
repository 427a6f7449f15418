//! Rephrase Server - HTTP API for LLM-backed text rephrasing
//!
//! Exposes the `rephrase` core over HTTP:
//!
//! - **One-shot**: `POST /rephrase` returns all four styles at once
//! - **Streaming**: `POST /rephrase/stream` sends per-style deltas as
//!   server-sent events, then one `final` (or `error`) event
//! - **Health & Metrics**: liveness/readiness probes and Prometheus metrics
//!
//! # Features
//!
//! - **Middleware**: CORS from an explicit allow-list, compression, request ID
//!   tracking, structured JSON logging
//! - **Configuration**: `rephrase.{toml,yaml,json}` plus `REPHRASE_*`
//!   environment variables; provider settings (`LLM_MODE`, `ALLOW_REAL_LLM`,
//!   `AZURE_OPENAI_*`, `FAKE_STREAM_*`) are re-read on every request
//! - **Error Handling**: every failure answers `{code, message, details}`
//! - **Graceful Shutdown**: SIGTERM and Ctrl+C
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe (503 when no provider can be built)
//! - `GET /metrics` - Prometheus metrics
//! - `POST /rephrase` - Rephrase text
//! - `POST /rephrase/stream` - Rephrase text, streamed

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod telemetry;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult, ErrorBody};
pub use server::{build_router, start_server};
pub use state::{env_provider_factory, ProviderFactory, ServerState};
