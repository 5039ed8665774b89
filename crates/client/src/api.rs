use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info};

use crate::agent::stream_answer;
use crate::state::ChatState;

// ── Health ────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ── Chat ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
}

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// `POST /mcp_client/chat`: stream the answer as chunked plain text.
///
/// Model text is forwarded as it arrives, with a progress marker line for
/// every tool call. Once streaming has started, failures can only be
/// reported inline, so a loop error ends the body with an `[error: ...]`
/// line under a `200`.
pub async fn chat(State(state): State<Arc<ChatState>>, Json(req): Json<ChatRequest>) -> Response {
    let prompt = req.prompt.trim().to_string();
    if prompt.is_empty() {
        return (StatusCode::BAD_REQUEST, "prompt must not be empty").into_response();
    }
    info!(chars = prompt.len(), "Chat request");

    let (tx, rx) = mpsc::channel::<String>(64);
    tokio::spawn(async move {
        if let Err(e) = stream_answer(&state.agent, prompt, &tx).await {
            error!(error = %e, "Chat turn failed");
            let _ = tx.send(format!("\n[error: {}]\n", e)).await;
        }
    });

    let body = Body::from_stream(ReceiverStream::new(rx).map(Ok::<_, Infallible>));
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
            (X_ACCEL_BUFFERING, "no"),
        ],
        body,
    )
        .into_response()
}
