//! Liveness endpoint.

use axum::{Json, Router, extract::State, routing::get};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Body of `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Open MCP sessions.
    pub sessions: usize,
    /// Registered tools.
    pub tools: usize,
}

/// Always `ok` while the process is serving; needs no MCP session.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        sessions: state.sessions.len(),
        tools: state.dispatcher.tools().len(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use datagovhk_tools::ToolRegistry;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_reports_sessions() {
        let state = AppState::new(ToolRegistry::new(), ServerConfig::new());
        state.sessions.create();
        let app = health_routes().with_state(state);

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();

        assert_eq!(health.status, "ok");
        assert_eq!(health.sessions, 1);
        assert_eq!(health.tools, 0);
    }
}
