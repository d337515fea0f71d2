//! Local cache for fetched authorization payloads.
//!
//! Entries are keyed by user identity. Expiry is owned by the cache: a
//! `load` of an expired entry returns `None`, exactly like a missing one.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::AuthzResult;

mod file;
mod memory;

pub use file::{CacheMeta, FileCache};
pub use memory::MemoryCache;

/// Key-value store for serialized authorization payloads.
#[async_trait]
pub trait PolicyCache: Send + Sync {
    /// Load the payload stored for `key`. `None` if missing or expired.
    async fn load(&self, key: &str) -> AuthzResult<Option<String>>;

    /// Store `payload` under `key` for `ttl_secs` seconds.
    async fn save(&self, key: &str, payload: &str, ttl_secs: u64) -> AuthzResult<()>;

    /// Drop the entry for `key`, if any.
    async fn evict(&self, key: &str) -> AuthzResult<()>;
}

/// Expiry instant `ttl_secs` from now, saturating at the maximum representable time.
pub(crate) fn expiry_after(ttl_secs: u64) -> DateTime<Utc> {
    i64::try_from(ttl_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_after() {
        let diff = expiry_after(3600) - Utc::now();
        assert!(diff.num_seconds() >= 3590 && diff.num_seconds() <= 3600);
    }

    #[test]
    fn test_expiry_after_saturates() {
        assert_eq!(expiry_after(u64::MAX), DateTime::<Utc>::MAX_UTC);
    }
}
