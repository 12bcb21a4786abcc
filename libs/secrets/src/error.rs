//! Error types for the secrets library

use cloud_core::{AuthError, ConfigError, RegistryError};
use thiserror::Error;

/// Errors that can occur when working with secrets
#[derive(Error, Debug)]
pub enum SecretsError {
    /// Failed to connect to the secrets provider
    #[error("Failed to connect to secrets provider: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Secret not found
    #[error("Secret not found: {0}")]
    NotFound(String),

    /// Permission denied
    #[error("Permission denied for secret: {0}")]
    PermissionDenied(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Missing or malformed setting
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Payload could not be decoded
    #[error("Failed to decode secret payload: {0}")]
    DecodeError(String),

    /// Payload checksum does not match
    #[error("Data corruption detected in secret {0}")]
    DataCorruption(String),

    /// Environment variable error
    #[error("Environment variable error: {0}")]
    EnvError(String),

    /// Operation not supported by this provider
    #[error("Operation not supported by {provider}: {operation}")]
    Unsupported {
        provider: &'static str,
        operation: &'static str,
    },

    /// Provider not available
    #[error("Provider not available: {0}")]
    ProviderUnavailable(String),

    /// Rate limited
    #[error("Rate limited, retry after: {0}")]
    RateLimited(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AuthError> for SecretsError {
    fn from(err: AuthError) -> Self {
        SecretsError::AuthenticationFailed(err.to_string())
    }
}

impl From<RegistryError> for SecretsError {
    fn from(err: RegistryError) -> Self {
        SecretsError::ProviderUnavailable(err.to_string())
    }
}
