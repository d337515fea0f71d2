//! On-disk policy cache with integrity verification on read.
//!
//! # Cache Structure
//!
//! ```text
//! ~/.cache/warden/cache/policies/{hex(user)}/
//!   payload.json     # Serialized authorization payload
//!   metadata.json    # Cache metadata
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, warn};

use super::{expiry_after, PolicyCache};
use crate::error::{AuthzError, AuthzResult};

const PAYLOAD_FILE: &str = "payload.json";
const METADATA_FILE: &str = "metadata.json";

/// Cache metadata stored alongside the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMeta {
    /// User the payload was fetched for.
    pub user: String,

    /// When the payload was stored.
    pub fetched_at: DateTime<Utc>,

    /// When the entry expires.
    pub expires_at: DateTime<Utc>,

    /// Payload digest (sha256:...).
    pub digest: String,
}

/// File-backed policy cache.
#[derive(Debug, Clone)]
pub struct FileCache {
    cache_dir: PathBuf,
}

impl FileCache {
    /// Create a cache in the default location.
    ///
    /// Default: `<platform cache dir>/warden/cache/policies`
    pub fn new() -> AuthzResult<Self> {
        let base = dirs::cache_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| AuthzError::Cache {
                message: "could not determine cache directory".to_string(),
            })?;

        Ok(Self::with_dir(
            base.join("warden").join("cache").join("policies"),
        ))
    }

    /// Create a cache with a custom directory.
    pub fn with_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Any user string maps to a single safe directory name.
    fn entry_dir(&self, key: &str) -> PathBuf {
        self.cache_dir.join(hex::encode(key.as_bytes()))
    }

    /// Get cached metadata without loading the payload.
    pub async fn get_metadata(&self, key: &str) -> Option<CacheMeta> {
        let meta_path = self.entry_dir(key).join(METADATA_FILE);
        let content = fs::read_to_string(&meta_path).await.ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Remove every cached entry.
    pub async fn clear(&self) -> AuthzResult<()> {
        if self.cache_dir.exists() {
            fs::remove_dir_all(&self.cache_dir)
                .await
                .map_err(|e| AuthzError::Cache {
                    message: format!("failed to clear cache: {}", e),
                })?;
            debug!("cleared policy cache");
        }
        Ok(())
    }

    /// Metadata of every cached entry, expired ones included.
    pub async fn list(&self) -> AuthzResult<Vec<CacheMeta>> {
        let mut result = Vec::new();

        if !self.cache_dir.exists() {
            return Ok(result);
        }

        let mut entries = fs::read_dir(&self.cache_dir)
            .await
            .map_err(|e| AuthzError::Cache {
                message: format!("failed to read cache directory: {}", e),
            })?;

        while let Some(entry) = entries.next_entry().await.map_err(|e| AuthzError::Cache {
            message: format!("failed to read directory entry: {}", e),
        })? {
            let meta_path = entry.path().join(METADATA_FILE);
            let Ok(content) = fs::read_to_string(&meta_path).await else {
                continue;
            };
            if let Ok(meta) = serde_json::from_str::<CacheMeta>(&content) {
                result.push(meta);
            }
        }

        result.sort_by(|a, b| a.user.cmp(&b.user));
        Ok(result)
    }
}

#[async_trait]
impl PolicyCache for FileCache {
    async fn load(&self, key: &str) -> AuthzResult<Option<String>> {
        let dir = self.entry_dir(key);
        let payload_path = dir.join(PAYLOAD_FILE);
        let meta_path = dir.join(METADATA_FILE);

        if !payload_path.exists() || !meta_path.exists() {
            debug!(key, "policy not in cache");
            return Ok(None);
        }

        let meta_content = fs::read_to_string(&meta_path)
            .await
            .map_err(|e| AuthzError::Cache {
                message: format!("failed to read cache metadata: {}", e),
            })?;
        let metadata: CacheMeta =
            serde_json::from_str(&meta_content).map_err(|e| AuthzError::Cache {
                message: format!("failed to parse cache metadata: {}", e),
            })?;

        if metadata.expires_at <= Utc::now() {
            debug!(key, expires_at = %metadata.expires_at, "cache entry expired");
            return Ok(None);
        }

        let payload = fs::read_to_string(&payload_path)
            .await
            .map_err(|e| AuthzError::Cache {
                message: format!("failed to read cached payload: {}", e),
            })?;

        let computed = compute_digest(&payload);
        if computed != metadata.digest {
            warn!(
                key,
                expected = %metadata.digest,
                actual = %computed,
                "cache integrity check failed, treating as miss"
            );
            return Ok(None);
        }

        debug!(key, "cache hit");
        Ok(Some(payload))
    }

    async fn save(&self, key: &str, payload: &str, ttl_secs: u64) -> AuthzResult<()> {
        let dir = self.entry_dir(key);

        fs::create_dir_all(&dir)
            .await
            .map_err(|e| AuthzError::Cache {
                message: format!("failed to create cache directory: {}", e),
            })?;

        let metadata = CacheMeta {
            user: key.to_string(),
            fetched_at: Utc::now(),
            expires_at: expiry_after(ttl_secs),
            digest: compute_digest(payload),
        };
        let meta_json = serde_json::to_string_pretty(&metadata).map_err(|e| AuthzError::Cache {
            message: format!("failed to serialize metadata: {}", e),
        })?;

        write_atomic(&dir.join(PAYLOAD_FILE), payload).await?;
        write_atomic(&dir.join(METADATA_FILE), &meta_json).await?;

        debug!(key, ttl_secs, "cached policy");
        Ok(())
    }

    async fn evict(&self, key: &str) -> AuthzResult<()> {
        let dir = self.entry_dir(key);

        if dir.exists() {
            fs::remove_dir_all(&dir)
                .await
                .map_err(|e| AuthzError::Cache {
                    message: format!("failed to evict cache entry: {}", e),
                })?;
            debug!(key, "evicted from cache");
        }

        Ok(())
    }
}

fn compute_digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("sha256:{:x}", hasher.finalize())
}

async fn write_atomic(path: &Path, content: &str) -> AuthzResult<()> {
    let temp_path = path.with_extension("tmp");

    fs::write(&temp_path, content)
        .await
        .map_err(|e| AuthzError::Cache {
            message: format!("failed to write temp file: {}", e),
        })?;

    fs::rename(&temp_path, path)
        .await
        .map_err(|e| AuthzError::Cache {
            message: format!("failed to rename temp file: {}", e),
        })?;

    Ok(())
}
