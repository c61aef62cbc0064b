//! Per-user Meta credential storage.
//!
//! One record per `user_id`, written by the OAuth callback and read by the
//! tool layer. The long-lived access token is encrypted at rest with
//! AES-256-GCM; the ad accounts seen at the last token refresh are kept
//! alongside it as a JSON snapshot.
//!
//! # Usage
//!
//! ```no_run
//! use meta_ads_mcp::credentials::{CredentialUpdate, TokenStore};
//!
//! # fn main() -> anyhow::Result<()> {
//! let key = std::env::var("META_ADS_ENCRYPTION_KEY")?;
//! let store = TokenStore::new("meta_ads.db", &key)?;
//!
//! store.upsert(&CredentialUpdate {
//!     user_id: "u1".to_string(),
//!     access_token: "EAAB...".to_string(),
//!     expires_at: chrono::Utc::now().timestamp() + 60 * 86400,
//!     linked_resources: vec![],
//! })?;
//!
//! if let Some(credential) = store.get("u1")? {
//!     println!("{} linked accounts", credential.linked_resources.len());
//! }
//!
//! store.delete("u1")?;
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

mod encryption;
mod storage;

pub use encryption::{SealedToken, TokenCipher};
pub use storage::TokenStore;

/// Lightweight ad account descriptor cached at token refresh time.
///
/// Only the fields the tools read are typed; anything else the Graph API
/// returned is kept in `extra` so the snapshot round-trips unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkedAccount {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LinkedAccount {
    /// Name shown to people: the account name, else its numeric id, else the node id.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.account_id.as_deref())
            .unwrap_or(&self.id)
    }

    /// The subset reported by status tools.
    pub fn summary(&self) -> Value {
        serde_json::json!({
            "id": self.id,
            "name": self.name,
            "account_id": self.account_id,
            "currency": self.currency,
        })
    }
}

/// A stored credential, decrypted.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredCredential {
    pub user_id: String,
    pub access_token: String,
    /// Unix seconds after which the token is unusable
    pub expires_at: i64,
    pub linked_resources: Vec<LinkedAccount>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Fields replaced on every write for a user.
#[derive(Clone, Debug)]
pub struct CredentialUpdate {
    pub user_id: String,
    pub access_token: String,
    pub expires_at: i64,
    pub linked_resources: Vec<LinkedAccount>,
}
