//! Plain JSON bridge to the tool registry.
//!
//! Not an MCP transport: no session, no JSON-RPC framing. A call answers with
//! the same `{content, isError}` shape an MCP `tools/call` would carry.

use crate::tools::{ToolError, ToolOutput, ToolRegistry};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct ToolsAppState {
    pub registry: Arc<ToolRegistry>,
}

/// Create tools API router
pub fn create_tools_router(state: ToolsAppState) -> Router {
    Router::new()
        .route("/tools", get(list_tools))
        .route("/tools/:name", post(call_tool))
        .with_state(Arc::new(state))
}

/// GET /tools
async fn list_tools(State(state): State<Arc<ToolsAppState>>) -> Json<Value> {
    Json(json!({ "tools": state.registry.definitions() }))
}

/// POST /tools/:name
///
/// Tool failures are reported in-band with `isError: true`; only an unknown
/// tool name is an HTTP error.
async fn call_tool(
    State(state): State<Arc<ToolsAppState>>,
    Path(name): Path<String>,
    Json(args): Json<Value>,
) -> Response {
    match state.registry.call(&name, args).await {
        Ok(output) => Json(output).into_response(),
        Err(e @ ToolError::UnknownTool(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
        Err(e) => {
            warn!(tool = %name, error = %e, "Tool call failed");
            Json(ToolOutput::error(&e)).into_response()
        }
    }
}
