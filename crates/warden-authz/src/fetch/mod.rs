//! Remote retrieval of authorization payloads.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use tracing::debug;
use url::Url;

use crate::config::DEFAULT_TIMEOUT_SECS;
use crate::error::{AuthzError, AuthzResult};

mod http;

use http::HttpBackend;

/// User agent sent with every fetch.
pub const WARDEN_USER_AGENT: &str = concat!("warden-authz/", env!("CARGO_PKG_VERSION"));

/// Source of serialized authorization payloads.
#[async_trait]
pub trait PolicyFetcher: Send + Sync {
    /// Fetch the serialized payload for `user`.
    async fn fetch(&self, user: &str) -> AuthzResult<String>;
}

/// HTTP fetcher: `GET <endpoint>?subject=<user>`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: HttpBackend,
}

impl HttpFetcher {
    pub fn new(endpoint: &str, headers: &BTreeMap<String, String>) -> AuthzResult<Self> {
        Self::with_timeout(endpoint, headers, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        endpoint: &str,
        headers: &BTreeMap<String, String>,
        timeout: Duration,
    ) -> AuthzResult<Self> {
        let endpoint = Url::parse(endpoint.trim()).map_err(|e| AuthzError::Config {
            message: format!("invalid endpoint '{}': {}", endpoint, e),
        })?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(WARDEN_USER_AGENT));
        for (name, value) in headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| AuthzError::Config {
                    message: format!("invalid header name '{}': {}", name, e),
                })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| AuthzError::Config {
                message: format!("invalid value for header '{}': {}", name, e),
            })?;
            default_headers.insert(header_name, header_value);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| AuthzError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http: HttpBackend { client, endpoint },
        })
    }

    pub fn endpoint(&self) -> &str {
        self.http.endpoint.as_str()
    }

    fn subject_url(&self, user: &str) -> Url {
        let mut url = self.http.endpoint.clone();
        url.query_pairs_mut().append_pair("subject", user);
        url
    }
}

#[async_trait]
impl PolicyFetcher for HttpFetcher {
    async fn fetch(&self, user: &str) -> AuthzResult<String> {
        let url = self.subject_url(user);
        debug!(url = %url, "fetching authorization data");

        let response = self.http.fetch_policy(url).await?;
        Ok(response.data)
    }
}
