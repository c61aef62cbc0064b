// Inbound HTTP surface

pub mod auth;
pub mod health;
pub mod tools;

pub use auth::{create_auth_router, AuthAppState, DEFAULT_USER_ID};
pub use health::{create_health_router, HealthAppState};
pub use tools::{create_tools_router, ToolsAppState};

use crate::oauth::OAuthFlow;
use crate::tools::ToolRegistry;
use axum::{http::Method, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Everything the routers need.
#[derive(Clone)]
pub struct AppState {
    pub flow: Arc<OAuthFlow>,
    pub registry: Arc<ToolRegistry>,
    pub meta_app_configured: bool,
}

/// Full application router with permissive CORS.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(create_health_router(HealthAppState {
            meta_app_configured: state.meta_app_configured,
        }))
        .merge(create_auth_router(AuthAppState { flow: state.flow }))
        .merge(create_tools_router(ToolsAppState {
            registry: state.registry,
        }))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any),
        )
}
