use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use super::{expiry_after, PolicyCache};
use crate::error::AuthzResult;

#[derive(Debug, Clone)]
struct Entry {
    payload: String,
    expires_at: DateTime<Utc>,
}

/// In-process cache. Contents are lost with the process.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[async_trait]
impl PolicyCache for MemoryCache {
    async fn load(&self, key: &str) -> AuthzResult<Option<String>> {
        let now = Utc::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => {
                    debug!(key, "policy not in cache");
                    return Ok(None);
                }
                Some(entry) if entry.expires_at > now => {
                    debug!(key, "cache hit");
                    return Ok(Some(entry.payload.clone()));
                }
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.expires_at <= now) {
            entries.remove(key);
            debug!(key, "cache entry expired");
        }
        Ok(None)
    }

    async fn save(&self, key: &str, payload: &str, ttl_secs: u64) -> AuthzResult<()> {
        let entry = Entry {
            payload: payload.to_string(),
            expires_at: expiry_after(ttl_secs),
        };
        self.entries.write().await.insert(key.to_string(), entry);
        debug!(key, ttl_secs, "cached policy");
        Ok(())
    }

    async fn evict(&self, key: &str) -> AuthzResult<()> {
        if self.entries.write().await.remove(key).is_some() {
            debug!(key, "evicted from cache");
        }
        Ok(())
    }
}
