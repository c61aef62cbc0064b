//! OAuth 2.0 authorization flow for connecting a Meta Ads account.
//!
//! Implements the authorization code flow:
//! 1. GET /auth/meta?user_id=.. → random state stored for 10 minutes,
//!    redirect to the Facebook login dialog
//! 2. User authorizes on facebook.com
//! 3. Facebook redirects to /auth/callback with `code` and `state`
//! 4. State consumed, code exchanged for a short-lived token, then upgraded
//!    to a long-lived token
//! 5. Ad accounts fetched with the new token; credential upserted
//!
//! The controller keeps nothing in memory between requests: pending states
//! live in a [`StateStore`], credentials in the [`TokenStore`].

mod exchange;
mod provider;
mod state_store;

pub use exchange::{exchange_code_for_token, get_long_lived_token, TokenResponse};
pub use provider::{MetaOAuthConfig, CALLBACK_PATH, DIALOG_URL, SCOPE};
pub use state_store::{run_state_cleanup, MemoryStateStore, StateStore};

use crate::credentials::{CredentialUpdate, LinkedAccount, TokenStore};
use crate::meta::MetaClient;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Lifetime of a pending state, in seconds.
pub const STATE_TTL_SECS: u64 = 600;

/// Assumed lifetime when the token endpoint omits `expires_in` (60 days).
pub const DEFAULT_LONG_LIVED_SECS: i64 = 60 * 86_400;

/// How many ad accounts to snapshot at connect time.
const ACCOUNT_SNAPSHOT_LIMIT: u32 = 200;

/// Callback failures.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// The provider redirected back with `error=...`
    #[error("{description}")]
    Provider { error: String, description: String },

    #[error("Missing code or state parameter")]
    MissingParameters,

    /// Never issued, already consumed, or expired; deliberately not told apart
    #[error("Invalid or expired state parameter")]
    InvalidState,

    #[error("{0}")]
    TokenExchange(String),

    #[error("{0}")]
    Storage(String),
}

impl OAuthError {
    /// Machine-readable reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            OAuthError::Provider { .. } => "oauth_error",
            OAuthError::MissingParameters => "missing_parameters",
            OAuthError::InvalidState => "invalid_state",
            OAuthError::TokenExchange(_) => "token_exchange_failed",
            OAuthError::Storage(_) => "storage_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            OAuthError::Provider { .. } | OAuthError::MissingParameters | OAuthError::InvalidState => {
                StatusCode::BAD_REQUEST
            }
            OAuthError::TokenExchange(_) | OAuthError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl IntoResponse for OAuthError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.reason(),
            message: self.to_string(),
        });
        (self.status(), body).into_response()
    }
}

/// OAuth callback query parameters
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Result of a completed callback.
#[derive(Debug, Clone)]
pub struct ConnectedAccount {
    pub user_id: String,
    pub accounts: Vec<LinkedAccount>,
    /// Lifetime reported for the long-lived token, in seconds
    pub expires_in: i64,
    pub expires_at: i64,
}

impl ConnectedAccount {
    /// Whole days until the token expires.
    pub fn days_until_expiry(&self) -> i64 {
        self.expires_in / 86_400
    }

    /// Confirmation page shown in the popup after connecting.
    pub fn render_html(&self) -> String {
        let accounts: String = self
            .accounts
            .iter()
            .take(5)
            .map(|acc| {
                format!(
                    "\n\t\t\t<div class=\"account\">{}</div>",
                    escape_html(acc.display_name())
                )
            })
            .collect();

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
	<title>Meta Ads Connected</title>
	<style>
		body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0; background: #f0f2f5; }}
		.container {{ background: white; padding: 3rem; border-radius: 12px; box-shadow: 0 10px 40px rgba(0,0,0,0.15); text-align: center; max-width: 500px; }}
		.accounts {{ background: #f7fafc; padding: 1rem; border-radius: 8px; margin: 1rem 0; text-align: left; }}
		.account {{ padding: 0.5rem; border-bottom: 1px solid #e2e8f0; }}
		.account:last-child {{ border-bottom: none; }}
		.expiry {{ font-size: 0.9rem; color: #999; }}
	</style>
</head>
<body>
	<div class="container">
		<h1>Successfully Connected!</h1>
		<p>Your Meta Ads account has been connected.</p>
		<div class="accounts">
			<strong>Found {count} Ad Account(s):</strong>{accounts}
		</div>
		<p class="expiry">Token expires in {days} days</p>
		<button onclick="window.close()">Close Window</button>
	</div>
</body>
</html>
"#,
            count = self.accounts.len(),
            accounts = accounts,
            days = self.days_until_expiry(),
        )
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Orchestrates the Meta OAuth flow.
#[derive(Clone)]
pub struct OAuthFlow {
    config: MetaOAuthConfig,
    states: Arc<dyn StateStore>,
    tokens: Arc<TokenStore>,
    http_client: reqwest::Client,
}

impl OAuthFlow {
    pub fn new(config: MetaOAuthConfig, states: Arc<dyn StateStore>, tokens: Arc<TokenStore>) -> Self {
        Self {
            config,
            states,
            tokens,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &MetaOAuthConfig {
        &self.config
    }

    /// Issue a state for `user_id` and return the login dialog URL.
    pub async fn start(&self, user_id: &str) -> Result<String, OAuthError> {
        let state = Uuid::new_v4().to_string();

        self.states
            .put(&state, user_id, STATE_TTL_SECS)
            .await
            .map_err(|e| {
                error!(user_id = %user_id, error = %e, "Failed to store OAuth state");
                OAuthError::Storage(format!("Failed to store OAuth state: {:#}", e))
            })?;

        info!(user_id = %user_id, "Redirecting to Meta OAuth dialog");
        Ok(self.config.build_auth_url(&state))
    }

    /// Complete the flow from the provider's redirect.
    ///
    /// The state is consumed atomically before any exchange, so a replayed
    /// callback fails with [`OAuthError::InvalidState`] even if the first one
    /// is still in flight.
    pub async fn callback(&self, params: CallbackParams) -> Result<ConnectedAccount, OAuthError> {
        if let Some(error) = params.error {
            let description = params
                .error_description
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| error.clone());
            warn!(error = %error, description = %description, "OAuth authorization failed");
            return Err(OAuthError::Provider { error, description });
        }

        let (Some(code), Some(state)) = (params.code, params.state) else {
            warn!("OAuth callback missing code or state");
            return Err(OAuthError::MissingParameters);
        };

        let user_id = self
            .states
            .take(&state)
            .await
            .map_err(|e| OAuthError::Storage(format!("Failed to read OAuth state: {:#}", e)))?
            .ok_or_else(|| {
                warn!("Invalid or expired OAuth state");
                OAuthError::InvalidState
            })?;

        debug!(user_id = %user_id, "OAuth state validated");

        let connected = self.connect(&user_id, &code).await.map_err(|e| {
            error!(user_id = %user_id, error = %e, "OAuth callback failed");
            e
        })?;

        info!(
            user_id = %user_id,
            accounts = connected.accounts.len(),
            expires_at = connected.expires_at,
            "OAuth flow completed successfully"
        );

        Ok(connected)
    }

    async fn connect(&self, user_id: &str, code: &str) -> Result<ConnectedAccount, OAuthError> {
        let exchange_failed = |e: anyhow::Error| OAuthError::TokenExchange(format!("{:#}", e));

        let short_lived = exchange_code_for_token(&self.http_client, &self.config, code)
            .await
            .map_err(exchange_failed)?;

        let long_lived = get_long_lived_token(&self.http_client, &self.config, &short_lived.access_token)
            .await
            .map_err(exchange_failed)?;

        let client = MetaClient::new(&long_lived.access_token, Some(&self.config.api_version))
            .with_graph_url(self.config.graph_url.clone())
            .with_http_client(self.http_client.clone());

        let response = client
            .get_ad_accounts("me", ACCOUNT_SNAPSHOT_LIMIT)
            .await
            .map_err(|e| OAuthError::TokenExchange(e.to_string()))?;

        let accounts: Vec<LinkedAccount> = match response.get("data") {
            Some(data) => serde_json::from_value(data.clone()).map_err(|e| {
                OAuthError::TokenExchange(format!("Unexpected ad account payload: {}", e))
            })?,
            None => Vec::new(),
        };

        let expires_in = long_lived.expires_in.unwrap_or(DEFAULT_LONG_LIVED_SECS);
        let expires_at = Utc::now().timestamp() + expires_in;

        self.tokens
            .upsert(&CredentialUpdate {
                user_id: user_id.to_string(),
                access_token: long_lived.access_token,
                expires_at,
                linked_resources: accounts.clone(),
            })
            .map_err(|e| OAuthError::Storage(format!("Failed to store credential: {:#}", e)))?;

        Ok(ConnectedAccount {
            user_id: user_id.to_string(),
            accounts,
            expires_in,
            expires_at,
        })
    }

    /// Remove the stored credential. Returns whether one existed.
    pub fn disconnect(&self, user_id: &str) -> anyhow::Result<bool> {
        let existed = self.tokens.delete(user_id)?;
        info!(user_id = %user_id, existed, "Meta Ads account disconnected");
        Ok(existed)
    }
}
