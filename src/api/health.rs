use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;

const SERVER_NAME: &str = "Meta Ads MCP (Self-Hosted)";

#[derive(Clone)]
pub struct HealthAppState {
    pub meta_app_configured: bool,
}

/// Create health/index router
pub fn create_health_router(state: HealthAppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .with_state(Arc::new(state))
}

/// GET /health
async fn health(State(state): State<Arc<HealthAppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "server": SERVER_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "meta_app_configured": state.meta_app_configured,
        "endpoints": {
            "oauth_start": "/auth/meta?user_id=YOUR_USER_ID",
            "oauth_callback": "/auth/callback",
            "disconnect": "/auth/disconnect",
            "tools": "/tools",
        }
    }))
}

/// GET /
async fn index() -> Json<Value> {
    Json(json!({
        "name": SERVER_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Self-hosted Meta Ads MCP server with OAuth support",
        "endpoints": [
            { "path": "/health", "method": "GET", "description": "Health check" },
            { "path": "/auth/meta?user_id=YOUR_ID", "method": "GET", "description": "Start OAuth flow" },
            { "path": "/auth/callback", "method": "GET", "description": "OAuth callback" },
            { "path": "/auth/disconnect", "method": "POST", "description": "Disconnect account" },
            { "path": "/tools", "method": "GET", "description": "List tools" },
            { "path": "/tools/:name", "method": "POST", "description": "Call a tool" },
        ]
    }))
}
