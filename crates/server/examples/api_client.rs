//! Walk through the rephrase API against a locally running server.
//!
//! Start the server first (`cargo run -p rephrase-server`), then
//! `cargo run -p rephrase-server --example api_client`.

use futures::StreamExt;
use reqwest::Client;
use serde_json::json;

const SERVER_URL: &str = "http://127.0.0.1:3000";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = Client::new();

    // Example 1: Health check
    println!("1. Health Check:");
    let resp = client.get(format!("{SERVER_URL}/health")).send().await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    // Example 2: Readiness (reports which provider the factory builds)
    println!("2. Readiness:");
    let resp = client.get(format!("{SERVER_URL}/ready")).send().await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    // Example 3: All four rewrites in one response
    println!("3. Rephrase:");
    let resp = client
        .post(format!("{SERVER_URL}/rephrase"))
        .json(&json!({ "text": "can u check the doc i sent yesterday" }))
        .send()
        .await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    // Example 4: Validation failure
    println!("4. Rephrase With Empty Text:");
    let resp = client
        .post(format!("{SERVER_URL}/rephrase"))
        .json(&json!({ "text": "   " }))
        .send()
        .await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    // Example 5: Per-style streaming, printed frame by frame
    println!("5. Rephrase Stream:");
    let resp = client
        .post(format!("{SERVER_URL}/rephrase/stream"))
        .json(&json!({ "text": "can u check the doc i sent yesterday" }))
        .send()
        .await?;
    println!("Status: {}", resp.status());
    let mut frames = resp.bytes_stream();
    while let Some(chunk) = frames.next().await {
        print!("{}", String::from_utf8_lossy(&chunk?));
    }
    println!();

    // Example 6: Metrics
    println!("6. Prometheus Metrics:");
    let resp = client.get(format!("{SERVER_URL}/metrics")).send().await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    println!("All examples completed!");
    Ok(())
}
