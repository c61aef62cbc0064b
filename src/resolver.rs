//! Resolves the Meta client a tool call should use.
//!
//! An operator-configured override token wins unconditionally. Otherwise the
//! caller's stored credential is used, provided it has at least a day left.

use crate::credentials::{StoredCredential, TokenStore};
use crate::meta::MetaClient;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Tokens with less than this many seconds left are treated as expired.
pub const EXPIRY_BUFFER_SECS: i64 = 86_400;

/// Why a caller cannot act on the Graph API.
#[derive(Debug, Error)]
pub enum AuthorizationError {
    #[error("User not authenticated. Please connect your Meta Ads account first.")]
    NotAuthenticated,

    #[error("Access token expired. Please reconnect your Meta Ads account.")]
    TokenExpired,

    #[error("Failed to load stored credential: {0}")]
    Storage(#[source] anyhow::Error),
}

/// True when fewer than [`EXPIRY_BUFFER_SECS`] remain before `expires_at`.
pub fn is_token_expired(expires_at: i64) -> bool {
    is_token_expired_at(expires_at, Utc::now().timestamp())
}

/// [`is_token_expired`] against an explicit clock.
pub fn is_token_expired_at(expires_at: i64, now: i64) -> bool {
    expires_at - now < EXPIRY_BUFFER_SECS
}

/// Settings shared by every client the resolver builds.
#[derive(Clone, Debug, Default)]
pub struct ClientSettings {
    pub api_version: Option<String>,
    /// Graph host override (mock server in tests)
    pub graph_url: Option<String>,
}

impl ClientSettings {
    pub fn client(&self, access_token: &str) -> MetaClient {
        let client = MetaClient::new(access_token, self.api_version.as_deref());
        match &self.graph_url {
            Some(url) => client.with_graph_url(url.clone()),
            None => client,
        }
    }
}

/// Maps a `user_id` to a ready-to-use [`MetaClient`].
#[derive(Clone)]
pub struct CredentialResolver {
    store: Arc<TokenStore>,
    override_token: Option<String>,
    settings: ClientSettings,
}

impl CredentialResolver {
    pub fn new(store: Arc<TokenStore>, settings: ClientSettings) -> Self {
        Self {
            store,
            override_token: None,
            settings,
        }
    }

    /// Use `token` for every caller, bypassing storage. Local testing only.
    pub fn with_override_token(mut self, token: Option<String>) -> Self {
        self.override_token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn override_token(&self) -> Option<&str> {
        self.override_token.as_deref()
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Stored credential for a user, without the expiry policy applied.
    pub fn stored(&self, user_id: &str) -> Result<Option<StoredCredential>, AuthorizationError> {
        self.store.get(user_id).map_err(AuthorizationError::Storage)
    }

    /// Client for `user_id`, or the reason the caller must (re)authenticate.
    pub fn client_for(&self, user_id: &str) -> Result<MetaClient, AuthorizationError> {
        if let Some(token) = &self.override_token {
            debug!(user_id = %user_id, "Using override access token");
            return Ok(self.settings.client(token));
        }

        let credential = self
            .stored(user_id)?
            .ok_or(AuthorizationError::NotAuthenticated)?;

        if is_token_expired(credential.expires_at) {
            debug!(user_id = %user_id, expires_at = credential.expires_at, "Stored token inside expiry buffer");
            return Err(AuthorizationError::TokenExpired);
        }

        Ok(self.settings.client(&credential.access_token))
    }
}
