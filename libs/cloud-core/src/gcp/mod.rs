//! Google Cloud plumbing shared by the GCP providers

mod auth;

pub use auth::AccessTokenProvider;

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use secrecy::Secret;
use serde::Deserialize;

use crate::{ConfigError, Environment};

pub const GCP_PROJECT: &str = "GCP_PROJECT";
pub const GCP_ACCESS_TOKEN: &str = "GCP_ACCESS_TOKEN";
pub const GOOGLE_OAUTH_ACCESS_TOKEN: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";
pub const GCE_METADATA_HOST: &str = "GCE_METADATA_HOST";
pub const GCP_HTTP_TIMEOUT_SECS: &str = "GCP_HTTP_TIMEOUT_SECS";

pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How GCP providers authenticate
#[derive(Debug, Clone)]
pub struct GcpCredentials {
    /// Pre-issued OAuth bearer token; when unset the metadata server is used
    pub access_token: Option<Secret<String>>,
    /// Host (and optional port) of the GCE metadata server
    pub metadata_host: String,
}

impl Default for GcpCredentials {
    fn default() -> Self {
        Self {
            access_token: None,
            metadata_host: DEFAULT_METADATA_HOST.to_string(),
        }
    }
}

impl GcpCredentials {
    /// Credentials from a fixed bearer token
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(Secret::new(token.into())),
            ..Self::default()
        }
    }

    pub fn from_env(env: &Environment) -> Self {
        let access_token = env
            .get(GCP_ACCESS_TOKEN)
            .or_else(|| env.get(GOOGLE_OAUTH_ACCESS_TOKEN))
            .map(Secret::new);

        Self {
            access_token,
            metadata_host: env.get_or(GCE_METADATA_HOST, DEFAULT_METADATA_HOST),
        }
    }
}

/// Read the HTTP timeout, treating `0` as "use the default"
pub fn timeout_from_env(env: &Environment) -> Result<Duration, ConfigError> {
    let secs = env
        .get_parsed::<u64>(GCP_HTTP_TIMEOUT_SECS)?
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    Ok(Duration::from_secs(secs))
}

/// Build the HTTP client used against Google APIs
pub fn http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Error answered by a Google API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    /// Canonical status name such as `NOT_FOUND`, when the body carried one
    pub reason: Option<String>,
    pub message: String,
}

impl ApiError {
    /// Consume a non-success response and decode Google's error envelope.
    /// Bodies that are not the JSON envelope are kept verbatim.
    pub async fn from_response(response: Response) -> Self {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => Self {
                status,
                reason: envelope.error.status,
                message: envelope.error.message,
            },
            Err(_) => Self {
                status,
                reason: None,
                message: body,
            },
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP {}: {}", self.status, self.message)
    }
}
