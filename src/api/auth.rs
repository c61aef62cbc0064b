//! Meta account connection endpoints.
//!
//! - GET /auth/meta?user_id=..  → 302 to the Facebook login dialog
//! - GET /auth/callback         → HTML confirmation, or JSON error
//! - POST /auth/disconnect      → remove the stored credential

use crate::oauth::{CallbackParams, OAuthFlow};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error};

/// User assumed when `/auth/meta` is hit without one.
pub const DEFAULT_USER_ID: &str = "default-user";

/// Shared application state for the auth API
#[derive(Clone)]
pub struct AuthAppState {
    pub flow: Arc<OAuthFlow>,
}

#[derive(Deserialize)]
pub struct StartParams {
    user_id: Option<String>,
}

#[derive(Deserialize)]
pub struct DisconnectRequest {
    user_id: String,
}

#[derive(Serialize)]
pub struct DisconnectResponse {
    success: bool,
    message: &'static str,
}

/// Create auth API router
pub fn create_auth_router(state: AuthAppState) -> Router {
    Router::new()
        .route("/auth/meta", get(oauth_start))
        .route("/auth/callback", get(oauth_callback))
        .route("/auth/disconnect", post(disconnect))
        .with_state(Arc::new(state))
}

/// GET /auth/meta
///
/// Stores a fresh state for the user and redirects to the login dialog.
async fn oauth_start(State(state): State<Arc<AuthAppState>>, Query(params): Query<StartParams>) -> Response {
    let user_id = params
        .user_id
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_USER_ID.to_string());

    debug!(user_id = %user_id, "OAuth start requested");

    if !state.flow.config().is_configured() {
        error!("OAuth start requested but META_APP_ID / META_APP_SECRET are not set");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "oauth_not_configured",
                "message": "Set META_APP_ID and META_APP_SECRET to enable account connection"
            })),
        )
            .into_response();
    }

    match state.flow.start(&user_id).await {
        Ok(auth_url) => (StatusCode::FOUND, [(header::LOCATION, auth_url)]).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /auth/callback
async fn oauth_callback(
    State(state): State<Arc<AuthAppState>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    debug!("OAuth callback received");

    match state.flow.callback(params).await {
        Ok(connected) => Html(connected.render_html()).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /auth/disconnect
async fn disconnect(
    State(state): State<Arc<AuthAppState>>,
    Json(request): Json<DisconnectRequest>,
) -> Response {
    match state.flow.disconnect(&request.user_id) {
        Ok(existed) => Json(DisconnectResponse {
            success: existed,
            message: if existed {
                "Account disconnected"
            } else {
                "No connected account"
            },
        })
        .into_response(),
        Err(e) => {
            error!(user_id = %request.user_id, error = %e, "Failed to disconnect account");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to disconnect account" })),
            )
                .into_response()
        }
    }
}
