//! Account-info API Client
//!
//! HTTP client for the third-party profile-info service. One GET per
//! lookup, no retries: a failed lookup ends the request.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use super::profile::{username_from_profile_url, AccountProfile};
use crate::constants;
use crate::error::FetchError;

/// Account API configuration
#[derive(Debug, Clone)]
pub struct AccountApiConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for AccountApiConfig {
    fn default() -> Self {
        Self {
            api_url: constants::get_account_api_url(),
            api_key: constants::get_account_api_key(),
            timeout_seconds: constants::get_account_api_timeout(),
        }
    }
}

/// Result of one lookup: the typed profile plus the raw payload for display
#[derive(Debug, Clone, Serialize)]
pub struct AccountLookup {
    pub username: String,
    pub profile: AccountProfile,
    pub payload: Value,
}

/// Account-info API client
pub struct AccountInfoClient {
    config: AccountApiConfig,
    http_client: reqwest::Client,
}

impl AccountInfoClient {
    pub fn new(config: AccountApiConfig) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| FetchError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http_client })
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.as_deref().map_or(false, |k| !k.is_empty())
    }

    /// Look up a profile link or bare username
    pub async fn lookup(&self, profile_link: &str) -> Result<AccountLookup, FetchError> {
        let username = username_from_profile_url(profile_link)?;
        let payload = self.fetch_payload(&username).await?;
        let profile = AccountProfile::from_payload(&payload)?;

        log::debug!(
            "Fetched profile {}: {} followers, {} following",
            username,
            profile.followers,
            profile.following
        );

        Ok(AccountLookup {
            username,
            profile,
            payload,
        })
    }

    async fn fetch_payload(&self, username: &str) -> Result<Value, FetchError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(FetchError::NotConfigured)?;

        let response = self
            .http_client
            .get(&self.config.api_url)
            .header("x-api-key", api_key)
            .header("Content-Type", "application/json")
            .query(&[("query", username)])
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if response.status().is_success() {
            response
                .json::<Value>()
                .await
                .map_err(|e| FetchError::MalformedPayload(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            log::error!("Account lookup for {} failed ({}): {}", username, status, body);
            Err(FetchError::Status { status, body })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_key: Option<&str>) -> AccountInfoClient {
        AccountInfoClient::new(AccountApiConfig {
            api_url: "http://127.0.0.1:9/unused".to_string(),
            api_key: api_key.map(str::to_string),
            timeout_seconds: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_is_configured() {
        assert!(client(Some("key")).is_configured());
        assert!(!client(Some("")).is_configured());
        assert!(!client(None).is_configured());
    }

    #[tokio::test]
    async fn test_lookup_rejects_bad_link_before_network() {
        let result = client(Some("key")).lookup("https://example.com/nope/").await;
        assert!(matches!(result, Err(FetchError::InvalidProfileLink(_))));
    }

    #[tokio::test]
    async fn test_lookup_without_key_fails() {
        let result = client(None).lookup("jd").await;
        assert!(matches!(result, Err(FetchError::NotConfigured)));
    }
}
