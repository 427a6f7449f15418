//! Rephrase Server - HTTP API for LLM-backed text rephrasing
//!
//! Reads `.env` (if present), loads configuration and serves until
//! SIGTERM or Ctrl+C.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    // Load configuration
    let config = ServerConfig::load()?;

    // Start server
    server::start_server(config).await?;

    Ok(())
}
