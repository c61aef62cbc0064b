//! Short-lived OAuth state storage for CSRF protection.
//!
//! Maps a random `state` value to the user that started the flow. Entries
//! expire after their TTL; an expired entry is indistinguishable from one that
//! never existed.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// Key-value store holding pending OAuth states.
///
/// `take` must remove and return the value in one atomic step so two
/// callbacks racing on the same state cannot both succeed.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Remove `key` and return its value if it was present and unexpired.
    async fn take(&self, key: &str) -> Result<Option<String>>;
}

#[derive(Clone, Debug)]
struct StateEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

impl StateEntry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// In-process [`StateStore`] backed by a concurrent map.
#[derive(Clone, Default)]
pub struct MemoryStateStore {
    entries: Arc<DashMap<String, StateEntry>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry.
    pub fn cleanup_expired(&self) {
        let now = Utc::now();
        self.entries.retain(|_, entry| entry.is_live(now));
    }

    /// Number of stored entries, expired ones included until cleanup.
    pub fn count(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        let ttl = Duration::seconds(ttl_seconds.min(u64::from(u32::MAX)) as i64);
        self.entries.insert(
            key.to_string(),
            StateEntry {
                value: value.to_string(),
                expires_at: Utc::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Utc::now();
        Ok(self
            .entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<String>> {
        let now = Utc::now();
        Ok(self
            .entries
            .remove(key)
            .map(|(_, entry)| entry)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value))
    }
}

/// Background task to periodically purge expired states.
///
/// An interval of zero is treated as one second.
pub async fn run_state_cleanup(store: MemoryStateStore, interval_seconds: u64) {
    let period = tokio::time::Duration::from_secs(interval_seconds.max(1));
    let mut interval = tokio::time::interval(period);

    loop {
        interval.tick().await;
        store.cleanup_expired();
        tracing::debug!(remaining = store.count(), "OAuth state cleanup complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = MemoryStateStore::new();
        store.put("state-1", "u1", 600).await.unwrap();

        assert_eq!(store.get("state-1").await.unwrap().as_deref(), Some("u1"));
        // get does not consume
        assert_eq!(store.get("state-1").await.unwrap().as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn test_take_is_single_use() {
        let store = MemoryStateStore::new();
        store.put("state-1", "u1", 600).await.unwrap();

        assert_eq!(store.take("state-1").await.unwrap().as_deref(), Some("u1"));
        assert_eq!(store.take("state-1").await.unwrap(), None);
        assert_eq!(store.get("state-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unknown_key() {
        let store = MemoryStateStore::new();
        assert_eq!(store.get("nope").await.unwrap(), None);
        assert_eq!(store.take("nope").await.unwrap(), None);
        store.delete("nope").await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_state_looks_absent() {
        let store = MemoryStateStore::new();
        store.put("state-1", "u1", 1).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(1_100)).await;

        assert_eq!(store.get("state-1").await.unwrap(), None);
        assert_eq!(store.take("state-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cleanup_removes_expired() {
        let store = MemoryStateStore::new();
        store.put("short", "u1", 1).await.unwrap();
        store.put("long", "u2", 600).await.unwrap();
        assert_eq!(store.count(), 2);

        tokio::time::sleep(std::time::Duration::from_millis(1_100)).await;

        store.cleanup_expired();
        assert_eq!(store.count(), 1);
        assert_eq!(store.get("long").await.unwrap().as_deref(), Some("u2"));
    }

    #[tokio::test]
    async fn test_cleanup_task_with_zero_interval_keeps_running() {
        let store = MemoryStateStore::new();
        store.put("short", "u1", 1).await.unwrap();

        let handle = tokio::spawn(run_state_cleanup(store.clone(), 0));
        tokio::time::sleep(std::time::Duration::from_millis(2_500)).await;

        assert!(!handle.is_finished());
        assert_eq!(store.count(), 0);
        handle.abort();
    }

    #[tokio::test]
    async fn test_concurrent_take_only_one_wins() {
        let store = MemoryStateStore::new();
        store.put("state-1", "u1", 600).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.take("state-1").await.unwrap() })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
