//! Streamable HTTP MCP endpoint.
//!
//! `POST` carries one JSON-RPC message per request. `initialize` opens a
//! session whose id is returned in `Mcp-Session-Id`; every other message
//! must carry a live session id. `DELETE` ends the session. `GET` is not
//! routed, so axum answers it with 405.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use datagovhk_mcp::protocol::SESSION_ID_HEADER;

use crate::dispatch::parse_message;
use crate::error::{Result, ServerError};
use crate::state::AppState;

/// Create the MCP routes at `path` and `path/`.
///
/// `path` must already be normalized by [`crate::normalize_mcp_path`].
pub fn mcp_routes(path: &str) -> Router<AppState> {
    let with_slash = format!("{}/", path);
    Router::new()
        .route(path, post(post_handler).delete(delete_handler))
        .route(&with_slash, post(post_handler).delete(delete_handler))
}

fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(SESSION_ID_HEADER).and_then(|v| v.to_str().ok())
}

fn require_session<'a>(state: &AppState, headers: &'a HeaderMap) -> Result<&'a str> {
    let id = session_id(headers)
        .ok_or_else(|| ServerError::BadRequest("Missing Mcp-Session-Id header".to_string()))?;
    if !state.sessions.contains(id) {
        return Err(ServerError::NotFound(format!("Unknown session: {}", id)));
    }
    Ok(id)
}

/// Handle one JSON-RPC message.
pub async fn post_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let message = match parse_message(&body) {
        Ok(message) => message,
        Err(error) => return Ok((StatusCode::BAD_REQUEST, Json(*error)).into_response()),
    };

    let is_initialize = message.method == "initialize" && !message.is_notification();
    if !is_initialize {
        require_session(&state, &headers)?;
    }

    let Some(response) = state.dispatcher.handle(message).await else {
        return Ok(StatusCode::ACCEPTED.into_response());
    };

    let opened_session = if is_initialize && !response.is_error() {
        Some(state.sessions.create())
    } else {
        None
    };

    let mut http_response = Json(response).into_response();
    if let Some(id) = opened_session {
        tracing::info!(session_id = %id, "MCP session opened");
        let value = HeaderValue::from_str(&id)
            .map_err(|e| ServerError::Internal(format!("invalid session id: {}", e)))?;
        http_response.headers_mut().insert(SESSION_ID_HEADER, value);
    }

    Ok(http_response)
}

/// End a session.
pub async fn delete_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode> {
    let id = require_session(&state, &headers)?;
    state.sessions.remove(id);
    tracing::info!(session_id = %id, "MCP session closed");
    Ok(StatusCode::NO_CONTENT)
}
