use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

use crate::error::StoreError;
use crate::utils::clock::Clock;

/// Key/value cache with per-entry TTLs. Values are opaque strings; the
/// coherence layer stores JSON in them.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Deletes every key matching `pattern`, where `*` matches any run of
    /// characters. Returns how many keys were removed.
    async fn delete_pattern(&self, pattern: &str) -> Result<u64, StoreError>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// In-process TTL cache. Expired entries are dropped lazily on read and in
/// bulk by [`TtlCache::purge_expired`].
pub struct TtlCache {
    entries: DashMap<String, CacheEntry>,
    clock: Arc<dyn Clock>,
}

impl TtlCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }
}

#[async_trait]
impl Cache for TtlCache {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = self.clock.now();
        let hit = self
            .entries
            .get(key)
            .map(|entry| (entry.value.clone(), entry.expires_at));

        match hit {
            Some((value, expires_at)) if expires_at > now => Ok(Some(value)),
            Some(_) => {
                self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| StoreError::Unavailable(format!("invalid ttl for {}: {}", key, e)))?;
        let expires_at = self.clock.now() + ttl;
        self.entries.insert(key.to_string(), CacheEntry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<u64, StoreError> {
        let matcher = glob_regex(pattern)?;
        let before = self.entries.len();
        self.entries.retain(|key, _| !matcher.is_match(key));
        Ok(before.saturating_sub(self.entries.len()) as u64)
    }
}

/// Compiles a `*`-only glob into an anchored regex; every other character
/// matches literally.
pub fn glob_regex(pattern: &str) -> Result<Regex, StoreError> {
    let body = regex::escape(pattern).replace(r"\*", ".*");
    Ok(Regex::new(&format!("^{}$", body))?)
}
