use anyhow::{Context, Result};
use meta_ads_mcp::api::{create_router, AppState};
use meta_ads_mcp::config::{load_config, AppConfig};
use meta_ads_mcp::credentials::TokenStore;
use meta_ads_mcp::oauth::{run_state_cleanup, MemoryStateStore, OAuthFlow};
use meta_ads_mcp::resolver::CredentialResolver;
use meta_ads_mcp::tools::{ServerStatus, ToolRegistry};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meta_ads_mcp=info".into()),
        )
        .init();

    info!("Meta Ads MCP starting...");

    // File config (optional) overlaid by environment
    let mut config = match std::env::var("META_ADS_CONFIG") {
        Ok(path) => load_config(&path)?,
        Err(_) => AppConfig::default(),
    };
    config.apply_env();

    info!(
        api_version = %config.meta.api_version,
        public_url = %config.server.public_url,
        db_path = %config.storage.db_path,
        port = config.server.port,
        meta_app_configured = config.meta_app_configured(),
        "Configuration loaded"
    );

    if config.meta.access_token.is_some() {
        warn!("META_ACCESS_TOKEN is set: every tool call uses it instead of stored credentials");
    }

    // Initialize token store
    let token_store = Arc::new(
        TokenStore::new(&config.storage.db_path, config.encryption_key()?)
            .context("Failed to initialize token store")?,
    );
    info!("Token store initialized");

    // OAuth state store + periodic cleanup
    let state_store = MemoryStateStore::new();
    tokio::spawn(run_state_cleanup(
        state_store.clone(),
        config.oauth.state_cleanup_interval_seconds,
    ));

    let flow = Arc::new(OAuthFlow::new(
        config.oauth_config(),
        Arc::new(state_store),
        Arc::clone(&token_store),
    ));

    let resolver = CredentialResolver::new(Arc::clone(&token_store), config.client_settings())
        .with_override_token(config.meta.access_token.clone());

    let registry = Arc::new(
        ToolRegistry::new(resolver)?.with_status(ServerStatus {
            has_meta_app_id: !config.meta.app_id.is_empty(),
            has_meta_app_secret: !config.meta.app_secret.is_empty(),
        }),
    );
    info!(tools = registry.definitions().len(), "Tool registry initialized");

    let router = create_router(AppState {
        flow,
        registry,
        meta_app_configured: config.meta_app_configured(),
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.server.port))
        .await
        .context("Failed to bind API port")?;
    info!(port = config.server.port, "API listening");

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!(error = %e, "API server error");
        }
    });

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl_c signal")?;
    info!("Shutdown signal received");

    server_handle.abort();
    info!("Meta Ads MCP stopped");

    Ok(())
}
