//! Authorizer configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default cache TTL for fetched authorization data (seconds).
pub const DEFAULT_CACHE_EXPIRED_TIME: u64 = 60;

/// Default HTTP request timeout (seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Authorizer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizerConfig {
    /// Mode name: `manual`, `auto` or `cookies`.
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Policy endpoint (auto mode).
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Extra headers sent with every fetch.
    #[serde(default)]
    pub request_headers: BTreeMap<String, String>,

    /// Cache TTL in seconds. Non-positive values fall back to the default.
    #[serde(default = "default_cache_expired_time")]
    pub cache_expired_time: i64,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// On-disk cache directory. In-memory cache when unset.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

fn default_mode() -> String {
    "manual".to_string()
}

fn default_cache_expired_time() -> i64 {
    DEFAULT_CACHE_EXPIRED_TIME as i64
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for AuthorizerConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            endpoint: None,
            request_headers: BTreeMap::new(),
            cache_expired_time: default_cache_expired_time(),
            timeout_secs: default_timeout(),
            cache_dir: None,
        }
    }
}

impl AuthorizerConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `WARDEN_MODE` | `manual`, `auto` or `cookies` |
    /// | `WARDEN_ENDPOINT` | Policy endpoint URL |
    /// | `WARDEN_REQUEST_HEADERS` | `Name: value` pairs separated by `;` |
    /// | `WARDEN_CACHE_TTL` | Cache TTL in seconds (default: 60) |
    /// | `WARDEN_TIMEOUT` | Request timeout in seconds (default: 30) |
    /// | `WARDEN_CACHE_DIR` | On-disk cache directory |
    pub fn from_env() -> Self {
        Self {
            mode: std::env::var("WARDEN_MODE").unwrap_or_else(|_| default_mode()),
            endpoint: std::env::var("WARDEN_ENDPOINT")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            request_headers: std::env::var("WARDEN_REQUEST_HEADERS")
                .map(|v| parse_header_list(&v))
                .unwrap_or_default(),
            cache_expired_time: std::env::var("WARDEN_CACHE_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_cache_expired_time),
            timeout_secs: std::env::var("WARDEN_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout),
            cache_dir: std::env::var_os("WARDEN_CACHE_DIR").map(PathBuf::from),
        }
    }

    /// Set the mode.
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    /// Set the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Add a request header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_headers.insert(name.into(), value.into());
        self
    }

    /// Set the cache TTL.
    pub fn with_cache_expired_time(mut self, secs: i64) -> Self {
        self.cache_expired_time = secs;
        self
    }

    /// Use an on-disk cache.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }
}

/// Parse `Name: value; Other: value` into a header map. Malformed pairs are dropped.
fn parse_header_list(raw: &str) -> BTreeMap<String, String> {
    raw.split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}
