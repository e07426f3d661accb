// src/cache.rs

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;

use crate::error::AppError;

/// Key-value cache with per-entry TTL.
///
/// Semantics follow a hosted KV namespace: `get`/`put`/`delete` on string
/// keys, expiry checked on read, last write wins. There is no background
/// eviction; expired entries are dropped when they are next looked up.
///
/// Keys are namespaced by convention:
/// * `questions:<subject>` - cached question listings
/// * `session:<token>`     - login sessions
/// * `user:profile:<id>`   - profile responses
#[derive(Clone, Default)]
pub struct KvCache {
    inner: Arc<RwLock<HashMap<String, Entry>>>,
}

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

impl KvCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored value, removing it if the TTL has elapsed.
    pub async fn get(&self, key: &str) -> Option<String> {
        {
            let map = self.inner.read().await;
            match map.get(key) {
                Some(entry) if !entry.is_expired() => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        // Entry was present but stale; drop it.
        self.inner.write().await.remove(key);
        None
    }

    /// Stores a value. `ttl = None` means the entry never expires.
    pub async fn put(&self, key: &str, value: String, ttl: Option<Duration>) {
        let entry = Entry {
            value,
            expires_at: ttl.map(|d| Instant::now() + d),
        };
        self.inner.write().await.insert(key.to_string(), entry);
    }

    pub async fn delete(&self, key: &str) {
        self.inner.write().await.remove(key);
    }

    /// JSON convenience wrapper around `get`.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key).await?;
        serde_json::from_str(&raw).ok()
    }

    /// JSON convenience wrapper around `put`.
    pub async fn put_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), AppError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
        self.put(key, raw, ttl).await;
        Ok(())
    }
}

/// Cache key for the question listing of one subject.
pub fn questions_key(subject: &str) -> String {
    format!("questions:{}", subject)
}

/// Cache key for a login session.
pub fn session_key(token: &str) -> String {
    format!("session:{}", token)
}

/// Cache key for a user profile response.
pub fn profile_key(user_id: i64) -> String {
    format!("user:profile:{}", user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_returns_value() {
        let cache = KvCache::new();
        cache.put("k", "v".to_string(), None).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn get_after_delete_returns_nothing() {
        let cache = KvCache::new();
        cache
            .put("session:abc", "{}".to_string(), Some(Duration::from_secs(60)))
            .await;
        cache.delete("session:abc").await;
        assert!(cache.get("session:abc").await.is_none());
    }

    #[tokio::test]
    async fn expired_entry_is_dropped() {
        let cache = KvCache::new();
        cache
            .put("k", "v".to_string(), Some(Duration::from_millis(10)))
            .await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn last_write_wins() {
        let cache = KvCache::new();
        cache.put("k", "old".to_string(), None).await;
        cache.put("k", "new".to_string(), None).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("new"));
    }
}
