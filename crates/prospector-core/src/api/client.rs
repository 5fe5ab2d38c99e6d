//! API client for the prospector backend.
//!
//! Authentication is cookie-based, so the underlying `reqwest::Client` keeps a
//! cookie store and every clone of `ApiClient` shares it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::User;
use crate::config::Config;
use crate::preferences::PreferencesRecord;

use super::{ApiError, IdentityApi, PreferencesApi};

// ============================================================================
// Constants
// ============================================================================

/// Default backend address for local development.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const AUTH_USER_PATH: &str = "/api/auth/user";
const PREFERENCES_PATH: &str = "/api/preferences";

/// API client for the prospector backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from the application configuration.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, url: &str) -> Result<T, ApiError> {
        response.json().await.map_err(|e| {
            warn!(url = url, error = %e, "Failed to parse JSON response");
            ApiError::InvalidResponse(format!("{}: {}", url, e))
        })
    }
}

#[async_trait]
impl IdentityApi for ApiClient {
    async fn current_user(&self) -> Result<User, ApiError> {
        let url = self.url(AUTH_USER_PATH);
        debug!(url = %url, "Checking identity");

        // Stale cached answers would hide a login or logout
        let response = self
            .client
            .get(&url)
            .header(header::CACHE_CONTROL, "no-store")
            .header(header::PRAGMA, "no-cache")
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::parse_json(response, &url).await
    }
}

#[async_trait]
impl PreferencesApi for ApiClient {
    async fn fetch_preferences(&self) -> Result<PreferencesRecord, ApiError> {
        let url = self.url(PREFERENCES_PATH);
        debug!(url = %url, "Fetching preferences");

        let response = self.client.get(&url).send().await?;
        let response = Self::check_response(response).await?;
        Self::parse_json(response, &url).await
    }

    async fn store_preferences(
        &self,
        record: &PreferencesRecord,
    ) -> Result<PreferencesRecord, ApiError> {
        let url = self.url(PREFERENCES_PATH);
        debug!(url = %url, "Storing preferences");

        let response = self.client.put(&url).json(record).send().await?;
        let response = Self::check_response(response).await?;
        Self::parse_json(response, &url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://localhost:5000/", Duration::from_secs(5))
            .expect("client should build");
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(
            client.url(AUTH_USER_PATH),
            "http://localhost:5000/api/auth/user"
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_a_network_error() {
        // Port 9 (discard) on loopback is not expected to accept HTTP
        let client = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(2))
            .expect("client should build");
        let err = client.current_user().await.unwrap_err();
        assert!(err.is_transient(), "expected transient error, got {err:?}");
    }
}
