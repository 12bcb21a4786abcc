//! Error types for the object storage library

use cloud_core::{AuthError, ConfigError, RegistryError};
use thiserror::Error;

/// Errors that can occur when working with object storage
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to connect to the storage provider
    #[error("Failed to connect to storage provider: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Bucket or object not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bucket or object already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Permission denied
    #[error("Permission denied for: {0}")]
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

    /// Provider response could not be decoded
    #[error("Failed to decode provider response: {0}")]
    DecodeError(String),

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

impl From<AuthError> for StorageError {
    fn from(err: AuthError) -> Self {
        StorageError::AuthenticationFailed(err.to_string())
    }
}

impl From<RegistryError> for StorageError {
    fn from(err: RegistryError) -> Self {
        StorageError::ProviderUnavailable(err.to_string())
    }
}
