//! OAuth token exchange against the Graph API token endpoint.
//!
//! Two single-attempt steps: authorization code → short-lived token, then
//! short-lived → long-lived token (`fb_exchange_token` grant).

use super::provider::MetaOAuthConfig;
use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Deserialize;

/// Token endpoint response.
#[derive(Deserialize, Debug)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Exchange an authorization code for a short-lived user token.
pub async fn exchange_code_for_token(
    client: &Client,
    config: &MetaOAuthConfig,
    code: &str,
) -> Result<TokenResponse> {
    tracing::debug!(token_url = %config.token_url(), "Exchanging authorization code for token");

    request_token(
        client,
        config,
        &[
            ("client_id", config.app_id.as_str()),
            ("client_secret", config.app_secret.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("code", code),
        ],
    )
    .await
    .map_err(|e| anyhow!("OAuth token exchange failed: {:#}", e))
}

/// Upgrade a short-lived token to a long-lived one (about 60 days).
pub async fn get_long_lived_token(
    client: &Client,
    config: &MetaOAuthConfig,
    short_lived_token: &str,
) -> Result<TokenResponse> {
    tracing::debug!("Exchanging short-lived token for long-lived token");

    request_token(
        client,
        config,
        &[
            ("grant_type", "fb_exchange_token"),
            ("client_id", config.app_id.as_str()),
            ("client_secret", config.app_secret.as_str()),
            ("fb_exchange_token", short_lived_token),
        ],
    )
    .await
    .map_err(|e| anyhow!("Long-lived token exchange failed: {:#}", e))
}

async fn request_token(
    client: &Client,
    config: &MetaOAuthConfig,
    params: &[(&str, &str)],
) -> Result<TokenResponse> {
    let response = client
        .get(config.token_url())
        .query(params)
        .send()
        .await
        .context("Failed to send token request")?;

    let status = response.status();
    let body = response
        .text()
        .await
        .context("Failed to read token response")?;

    if !status.is_success() {
        // Embed the provider's JSON error verbatim when there is one
        let detail = serde_json::from_str::<serde_json::Value>(&body)
            .map(|v| v.to_string())
            .unwrap_or(body);
        return Err(anyhow!("{}", detail));
    }

    serde_json::from_str(&body).context("Failed to parse token response")
}
