//! Access tokens for Google APIs
//!
//! Either a pre-issued bearer token, or a token minted by the GCE metadata
//! server for the instance's default service account.

use std::time::{Duration, Instant};

use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use super::GcpCredentials;
use crate::AuthError;

const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

/// Token with expiration tracking
struct CachedToken {
    token: Secret<String>,
    expires_at: Instant,
}

impl CachedToken {
    fn new(token: String, expires_in: u64) -> Self {
        // Refresh 30 seconds before the token actually expires
        let expires_in = expires_in.saturating_sub(30);
        Self {
            token: Secret::new(token),
            expires_at: Instant::now() + Duration::from_secs(expires_in),
        }
    }

    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Hands out bearer tokens for GCP requests
pub struct AccessTokenProvider {
    http: Client,
    credentials: GcpCredentials,
    cached: RwLock<Option<CachedToken>>,
}

impl AccessTokenProvider {
    pub fn new(http: Client, credentials: GcpCredentials) -> Self {
        Self {
            http,
            credentials,
            cached: RwLock::new(None),
        }
    }

    fn token_url(&self) -> String {
        format!("http://{}{}", self.credentials.metadata_host, TOKEN_PATH)
    }

    /// Get a valid access token, refreshing from the metadata server if necessary
    pub async fn token(&self) -> Result<Secret<String>, AuthError> {
        if let Some(ref token) = self.credentials.access_token {
            return Ok(Secret::new(token.expose_secret().clone()));
        }

        {
            let guard = self.cached.read().await;
            if let Some(ref cached) = *guard {
                if cached.is_valid() {
                    return Ok(Secret::new(cached.token.expose_secret().clone()));
                }
            }
        }

        let response = self.fetch_token().await?;
        let token = Secret::new(response.access_token.clone());

        {
            let mut guard = self.cached.write().await;
            *guard = Some(CachedToken::new(response.access_token, response.expires_in));
        }

        Ok(token)
    }

    /// Drop the cached token so the next request fetches a fresh one
    pub async fn invalidate(&self) {
        let mut guard = self.cached.write().await;
        *guard = None;
    }

    async fn fetch_token(&self) -> Result<TokenResponse, AuthError> {
        debug!(host = %self.credentials.metadata_host, "Fetching access token from metadata server");

        let response = self
            .http
            .get(self.token_url())
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| AuthError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected(format!("HTTP {status}: {body}")));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))
    }
}
