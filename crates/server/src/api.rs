use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{debug, error, warn};

use finder_mcp::types::{JsonRpcResponse, RpcId};

use crate::state::AppState;

// ── Health ────────────────────────────────────────────────────────

#[derive(Serialize, serde::Deserialize)]
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

// ── MCP over HTTP ─────────────────────────────────────────────────

/// `POST /mcp`: one JSON-RPC message in, at most one out.
///
/// Notifications and ignored methods get `204 No Content`. A body that is
/// not JSON-RPC gets `400` with the error object and a null id.
pub async fn mcp_rpc(State(state): State<Arc<AppState>>, body: String) -> Response {
    debug!(message = %body, "Received MCP request over HTTP");

    match state.mcp.handle_message(&body).await {
        Ok(Some(response)) => Json(response).into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            warn!(error = %e, "Rejecting malformed MCP request");
            let response = JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id: RpcId::Null,
                result: None,
                error: Some(e.to_rpc_error()),
            };
            (StatusCode::BAD_REQUEST, Json(response)).into_response()
        }
    }
}

// ── Humans listing ────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// `GET /mcp_api/load_humans`: the table for the front-end.
pub async fn load_humans(State(state): State<Arc<AppState>>) -> Response {
    match state.store.get_humans().await {
        Ok(humans) => Json(humans).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to load humans");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
