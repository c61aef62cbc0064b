//! SQLite-backed token store.
//!
//! One row per user. The access token is encrypted with AES-256-GCM before it
//! touches disk; the linked account snapshot is stored as JSON text.

use super::{CredentialUpdate, LinkedAccount, SealedToken, StoredCredential, TokenCipher};
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Encrypted per-user credential storage backed by SQLite.
///
/// # Schema
/// ```sql
/// CREATE TABLE user_tokens (
///     user_id TEXT PRIMARY KEY,
///     access_token TEXT NOT NULL,        -- Encrypted
///     access_token_nonce TEXT NOT NULL,  -- Nonce for access_token
///     token_expires_at INTEGER NOT NULL, -- Unix seconds
///     ad_accounts TEXT NOT NULL,         -- JSON array
///     created_at INTEGER NOT NULL,       -- Unix seconds, set once
///     updated_at INTEGER NOT NULL        -- Unix seconds
/// );
/// ```
///
/// # Thread Safety
/// - Connection is wrapped in Mutex; each call is a single statement, so
///   SQLite's own atomicity covers concurrent upserts and deletes
pub struct TokenStore {
    conn: Mutex<Connection>,
    cipher: TokenCipher,
}

impl TokenStore {
    /// Creates or opens a token store.
    ///
    /// # Arguments
    /// * `db_path` - Path to SQLite database file (`:memory:` for tests)
    /// * `encryption_key` - Base64-encoded 32-byte master key
    pub fn new<P: AsRef<Path>>(db_path: P, encryption_key: &str) -> Result<Self> {
        let cipher = TokenCipher::from_base64_key(encryption_key).context("Invalid encryption key")?;

        let conn = Connection::open(db_path).context("Failed to open database")?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS user_tokens (
                user_id TEXT PRIMARY KEY,
                access_token TEXT NOT NULL,
                access_token_nonce TEXT NOT NULL,
                token_expires_at INTEGER NOT NULL,
                ad_accounts TEXT NOT NULL DEFAULT '[]',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
            [],
        )
        .context("Failed to create user_tokens table")?;

        Ok(Self {
            conn: Mutex::new(conn),
            cipher,
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Token store connection lock poisoned"))
    }

    /// Writes the credential for a user, replacing any existing one.
    ///
    /// Token, expiry, account snapshot and `updated_at` are overwritten;
    /// `created_at` keeps the value from the first write.
    pub fn upsert(&self, update: &CredentialUpdate) -> Result<()> {
        self.upsert_at(update, Utc::now().timestamp())
    }

    /// [`TokenStore::upsert`] with an explicit write time.
    pub fn upsert_at(&self, update: &CredentialUpdate, now: i64) -> Result<()> {
        let sealed = self
            .cipher
            .seal(&update.access_token)
            .context("Failed to encrypt access token")?;
        let accounts = serde_json::to_string(&update.linked_resources)
            .context("Failed to serialize linked accounts")?;

        self.conn()?
            .execute(
                r#"
                INSERT INTO user_tokens (
                    user_id, access_token, access_token_nonce,
                    token_expires_at, ad_accounts, created_at, updated_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                ON CONFLICT(user_id) DO UPDATE SET
                    access_token = excluded.access_token,
                    access_token_nonce = excluded.access_token_nonce,
                    token_expires_at = excluded.token_expires_at,
                    ad_accounts = excluded.ad_accounts,
                    updated_at = excluded.updated_at
                "#,
                params![
                    update.user_id,
                    sealed.ciphertext,
                    sealed.nonce,
                    update.expires_at,
                    accounts,
                    now,
                ],
            )
            .context("Failed to store credential")?;

        Ok(())
    }

    /// Retrieves and decrypts the credential for a user.
    ///
    /// # Returns
    /// * `Ok(Some(StoredCredential))` - Record found
    /// * `Ok(None)` - User never connected (or disconnected)
    /// * `Err` - Decryption or database failure
    pub fn get(&self, user_id: &str) -> Result<Option<StoredCredential>> {
        let row = self
            .conn()?
            .query_row(
                r#"
                SELECT access_token, access_token_nonce, token_expires_at,
                       ad_accounts, created_at, updated_at
                FROM user_tokens
                WHERE user_id = ?1
                "#,
                params![user_id],
                |row| {
                    Ok((
                        SealedToken {
                            ciphertext: row.get(0)?,
                            nonce: row.get(1)?,
                        },
                        row.get::<_, i64>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                },
            )
            .optional()
            .context("Failed to query credential")?;

        let Some((sealed, expires_at, accounts, created_at, updated_at)) = row else {
            return Ok(None);
        };

        let access_token = self
            .cipher
            .open(&sealed)
            .context("Failed to decrypt access token")?;

        let linked_resources = parse_accounts(accounts.as_deref())?;

        Ok(Some(StoredCredential {
            user_id: user_id.to_string(),
            access_token,
            expires_at,
            linked_resources,
            created_at,
            updated_at,
        }))
    }

    /// Deletes the credential for a user.
    ///
    /// # Returns
    /// * `Ok(true)` - A record existed and was removed
    /// * `Ok(false)` - Nothing stored for this user
    pub fn delete(&self, user_id: &str) -> Result<bool> {
        let rows_affected = self
            .conn()?
            .execute("DELETE FROM user_tokens WHERE user_id = ?1", params![user_id])
            .context("Failed to delete credential")?;

        Ok(rows_affected > 0)
    }
}

fn parse_accounts(raw: Option<&str>) -> Result<Vec<LinkedAccount>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(text) => serde_json::from_str(text).context("Failed to parse stored ad accounts"),
    }
}
