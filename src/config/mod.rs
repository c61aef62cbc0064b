use crate::meta::DEFAULT_API_VERSION;
use crate::oauth::MetaOAuthConfig;
use crate::resolver::ClientSettings;
use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Complete server configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub meta: MetaConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub oauth: OAuthSettings,
}

/// Meta app credentials and Graph API settings
#[derive(Clone, Deserialize)]
pub struct MetaConfig {
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub app_secret: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Operator token used for every caller instead of stored credentials.
    /// Local testing only.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Graph API host override
    #[serde(default)]
    pub graph_base_url: Option<String>,
    /// Login dialog host override
    #[serde(default)]
    pub auth_dialog_base_url: Option<String>,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_secret: String::new(),
            api_version: default_api_version(),
            access_token: None,
            graph_base_url: None,
            auth_dialog_base_url: None,
        }
    }
}

impl std::fmt::Debug for MetaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetaConfig")
            .field("app_id", &self.app_id)
            .field("api_version", &self.api_version)
            .field("access_token_set", &self.access_token.is_some())
            .field("graph_base_url", &self.graph_base_url)
            .finish_non_exhaustive()
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Externally reachable origin; the OAuth redirect URI is built from it
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

fn default_port() -> u16 {
    8787
}

fn default_public_url() -> String {
    "http://localhost:8787".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            public_url: default_public_url(),
        }
    }
}

/// Credential database configuration
#[derive(Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    /// Base64-encoded 32-byte AES key
    #[serde(default)]
    pub encryption_key: Option<String>,
}

fn default_db_path() -> String {
    "meta_ads.db".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            encryption_key: None,
        }
    }
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("db_path", &self.db_path)
            .field("encryption_key_set", &self.encryption_key.is_some())
            .finish()
    }
}

/// OAuth state housekeeping
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthSettings {
    /// How often expired states are purged (seconds)
    #[serde(default = "default_cleanup_interval")]
    pub state_cleanup_interval_seconds: u64,
}

fn default_cleanup_interval() -> u64 {
    300
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            state_cleanup_interval_seconds: default_cleanup_interval(),
        }
    }
}

impl AppConfig {
    /// Overlay `META_*` environment variables onto this config.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    /// Overlay variables from `lookup`; empty values are ignored.
    pub fn apply_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = var("META_APP_ID") {
            self.meta.app_id = v;
        }
        if let Some(v) = var("META_APP_SECRET") {
            self.meta.app_secret = v;
        }
        if let Some(v) = var("META_API_VERSION") {
            self.meta.api_version = v;
        }
        if let Some(v) = var("META_ACCESS_TOKEN") {
            self.meta.access_token = Some(v);
        }
        if let Some(v) = var("META_GRAPH_URL") {
            self.meta.graph_base_url = Some(v);
        }
        if let Some(v) = var("META_ADS_PUBLIC_URL") {
            self.server.public_url = v;
        }
        if let Some(v) = var("META_ADS_PORT") {
            match v.parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %v, "Ignoring invalid META_ADS_PORT"),
            }
        }
        if let Some(v) = var("META_ADS_DB") {
            self.storage.db_path = v;
        }
        if let Some(v) = var("META_ADS_ENCRYPTION_KEY") {
            self.storage.encryption_key = Some(v);
        }
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.oauth.state_cleanup_interval_seconds == 0 {
            bail!("oauth.state_cleanup_interval_seconds must be at least 1");
        }
        Ok(())
    }

    /// Both app credentials are present.
    pub fn meta_app_configured(&self) -> bool {
        !self.meta.app_id.is_empty() && !self.meta.app_secret.is_empty()
    }

    pub fn oauth_config(&self) -> MetaOAuthConfig {
        let mut config = MetaOAuthConfig::new(
            self.meta.app_id.clone(),
            self.meta.app_secret.clone(),
            &self.server.public_url,
        );
        config.api_version = self.meta.api_version.clone();
        if let Some(url) = &self.meta.graph_base_url {
            config.graph_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = &self.meta.auth_dialog_base_url {
            config.dialog_url = url.trim_end_matches('/').to_string();
        }
        config
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            api_version: Some(self.meta.api_version.clone()),
            graph_url: self.meta.graph_base_url.clone(),
        }
    }

    /// The at-rest encryption key, which the token store cannot open without.
    pub fn encryption_key(&self) -> Result<&str> {
        self.storage
            .encryption_key
            .as_deref()
            .context("META_ADS_ENCRYPTION_KEY is not set (base64-encoded 32-byte key)")
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path))?;
    let config: AppConfig =
        toml::from_str(&contents).with_context(|| format!("Failed to parse config file {}", path))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file {}", path))?;
    Ok(config)
}
