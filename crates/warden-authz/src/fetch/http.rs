//! HTTP layer: status mapping and response envelope parsing.
//!
//! This is the ONLY place for status code handling. fetch/mod.rs never
//! interprets status codes.

use reqwest::StatusCode;
use tracing::debug;
use url::Url;

use crate::error::{AuthzError, AuthzResult};
use crate::types::PolicyResponse;

/// Longest body excerpt carried in an error message.
const MAX_ERROR_BODY: usize = 200;

/// HTTP backend for making requests (holds reqwest client and endpoint).
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) endpoint: Url,
}

impl HttpBackend {
    /// GET `url` and decode the `{ message, data }` envelope.
    pub(crate) async fn fetch_policy(&self, url: Url) -> AuthzResult<PolicyResponse> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        match status {
            s if s.is_success() => {
                let body = response.text().await.map_err(|e| AuthzError::Network {
                    message: format!("failed to read response body: {}", e),
                })?;
                let envelope: PolicyResponse =
                    serde_json::from_str(&body).map_err(|e| AuthzError::InvalidResponse {
                        message: format!("failed to parse policy response: {}", e),
                    })?;
                debug!(message = %envelope.message, bytes = envelope.data.len(), "policy fetched");
                Ok(envelope)
            }

            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthzError::Unauthorized {
                message: format!("policy endpoint returned {}", status.as_u16()),
            }),

            _ => {
                let body = response.text().await.unwrap_or_default();
                let message: String = if body.is_empty() {
                    status.to_string()
                } else {
                    body.chars().take(MAX_ERROR_BODY).collect()
                };
                Err(AuthzError::Network {
                    message: format!("HTTP {}: {}", status.as_u16(), message),
                })
            }
        }
    }
}
