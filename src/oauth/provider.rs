//! Meta OAuth application settings.

use crate::meta::{DEFAULT_API_VERSION, GRAPH_URL};

/// Facebook Login dialog host.
pub const DIALOG_URL: &str = "https://www.facebook.com";

/// Parent permission for Marketing API access (covers ads_management).
pub const SCOPE: &str = "business_management";

/// Path the provider redirects back to.
pub const CALLBACK_PATH: &str = "/auth/callback";

/// OAuth configuration for the Meta app.
#[derive(Clone)]
pub struct MetaOAuthConfig {
    pub app_id: String,
    pub app_secret: String,
    pub api_version: String,
    /// Fixed redirect URI registered with the app
    pub redirect_uri: String,
    pub dialog_url: String,
    pub graph_url: String,
}

impl std::fmt::Debug for MetaOAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetaOAuthConfig")
            .field("app_id", &self.app_id)
            .field("api_version", &self.api_version)
            .field("redirect_uri", &self.redirect_uri)
            .finish_non_exhaustive()
    }
}

impl MetaOAuthConfig {
    /// Settings for the public Facebook endpoints.
    ///
    /// `public_url` is this service's externally reachable origin.
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>, public_url: &str) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            redirect_uri: format!("{}{}", public_url.trim_end_matches('/'), CALLBACK_PATH),
            dialog_url: DIALOG_URL.to_string(),
            graph_url: GRAPH_URL.to_string(),
        }
    }

    /// Both app credentials are present.
    pub fn is_configured(&self) -> bool {
        !self.app_id.is_empty() && !self.app_secret.is_empty()
    }

    /// Graph API token endpoint.
    pub fn token_url(&self) -> String {
        format!("{}/{}/oauth/access_token", self.graph_url, self.api_version)
    }

    /// Build the login dialog URL carrying `state`.
    pub fn build_auth_url(&self, state: &str) -> String {
        format!(
            "{}/{}/dialog/oauth?client_id={}&redirect_uri={}&scope={}&state={}&response_type=code",
            self.dialog_url,
            self.api_version,
            urlencoding::encode(&self.app_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(SCOPE),
            urlencoding::encode(state)
        )
    }
}
