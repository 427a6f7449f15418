//! `POST /rephrase/stream`
//!
//! Each request gets a driver task that owns the accumulation buffer and
//! pushes ready-made SSE events into a bounded channel; the response body
//! drains the channel. The channel is the disconnect signal: when the
//! client goes away axum drops the body, the receiver goes with it, and the
//! driver notices at its next poll or send and stops without asking the
//! provider for anything else.
//!
//! Wire format:
//!
//! ```text
//! : ping
//!
//! event: partial
//! data: {"style":"professional","delta":"Please r"}
//!
//! event: final
//! data: {"professional":"...","casual":"...","polite":"...","social":"..."}
//! ```
//!
//! A failure at any point replaces `final` with a single `error` event.

use super::read_text;
use crate::error::ApiError;
use crate::state::ServerState;
use crate::telemetry::{record_request, record_stream_event};
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONNECTION};
use axum::http::HeaderName;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use futures::stream::{self, Stream, StreamExt};
use rephrase::{generate_rephrases_stream, RephraseAccumulator, StyleDelta};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

const ENDPOINT: &str = "rephrase_stream";

/// The driver runs at most one event ahead of the client.
const EVENT_BUFFER: usize = 1;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

const INTERNAL_ERROR_EVENT: &str =
    r#"{"code":"INTERNAL_ERROR","message":"Internal server error.","details":[]}"#;

/// Stream per-style deltas as server-sent events
pub async fn rephrase_stream(
    State(state): State<Arc<ServerState>>,
    body: Result<Bytes, BytesRejection>,
) -> impl IntoResponse {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    tokio::spawn(drive(state, read_text(body), tx));

    let ping = stream::once(async { Ok::<_, Infallible>(Event::default().comment("ping")) });
    let sse = Sse::new(ping.chain(receiver_stream(rx)))
        .keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL));

    (
        [
            (CACHE_CONTROL, "no-cache"),
            (CONNECTION, "keep-alive"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        sse,
    )
}

fn receiver_stream(rx: mpsc::Receiver<Event>) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(rx, |mut rx| async move {
        let event = rx.recv().await?;
        Some((Ok(event), rx))
    })
}

/// Produce the whole event sequence for one request.
async fn drive(
    state: Arc<ServerState>,
    validated: Result<String, ApiError>,
    tx: mpsc::Sender<Event>,
) {
    let started = Instant::now();
    let outcome = run(&state, validated, &tx).await;

    let label = match &outcome {
        Outcome::Completed => "ok",
        Outcome::Failed(err) => err.outcome(),
        Outcome::Disconnected => "disconnected",
    };
    record_request(ENDPOINT, label, started.elapsed());

    if let Outcome::Failed(err) = outcome {
        if let ApiError::Provider(provider_err) = &err {
            tracing::warn!(code = provider_err.code(), error = %provider_err, "stream failed");
        }
        send(&tx, "error", &err.body()).await;
    }
}

enum Outcome {
    Completed,
    Failed(ApiError),
    Disconnected,
}

async fn run(
    state: &ServerState,
    validated: Result<String, ApiError>,
    tx: &mpsc::Sender<Event>,
) -> Outcome {
    let text = match validated {
        Ok(text) => text,
        Err(err) => return Outcome::Failed(err),
    };
    let provider = match state.provider() {
        Ok(provider) => provider,
        Err(err) => return Outcome::Failed(err.into()),
    };

    let mut deltas = generate_rephrases_stream(provider, text);
    let mut accumulator = RephraseAccumulator::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = tx.closed() => {
                tracing::debug!("client disconnected, stopping stream");
                return Outcome::Disconnected;
            }
            next = deltas.next() => next,
        };

        match next {
            Some(Ok(delta)) => {
                accumulator.push(&delta);
                if !send_partial(tx, &delta).await {
                    tracing::debug!("client disconnected, stopping stream");
                    return Outcome::Disconnected;
                }
            }
            Some(Err(err)) => return Outcome::Failed(err.into()),
            None => break,
        }
    }

    if send(tx, "final", &accumulator.finish()).await {
        Outcome::Completed
    } else {
        Outcome::Disconnected
    }
}

async fn send_partial(tx: &mpsc::Sender<Event>, delta: &StyleDelta) -> bool {
    send(tx, "partial", delta).await
}

/// Returns false once the client is gone.
async fn send<T: Serialize>(tx: &mpsc::Sender<Event>, name: &'static str, payload: &T) -> bool {
    let event = match Event::default().event(name).json_data(payload) {
        Ok(event) => event,
        Err(err) => {
            tracing::error!(error = %err, event = name, "failed to encode SSE event");
            Event::default().event("error").data(INTERNAL_ERROR_EVENT)
        }
    };

    let delivered = tx.send(event).await.is_ok();
    if delivered {
        record_stream_event(name);
    }
    delivered
}
