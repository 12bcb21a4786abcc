//! Error types shared across providers

use thiserror::Error;

/// Errors raised while reading provider configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting is not present
    #[error("missing required setting: {0}")]
    Missing(String),

    /// A setting is present but cannot be used
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: String, reason: String },
}

/// Errors raised while obtaining credentials
#[derive(Error, Debug)]
pub enum AuthError {
    /// The token endpoint could not be reached
    #[error("failed to reach token endpoint: {0}")]
    Unreachable(String),

    /// The token endpoint answered with an error
    #[error("token request rejected: {0}")]
    Rejected(String),

    /// The token response could not be decoded
    #[error("invalid token response: {0}")]
    InvalidResponse(String),
}

/// Errors raised by provider registries
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No factory is registered under the requested id
    #[error("unknown {kind} provider '{id}' (available: {})", .available.join(", "))]
    UnknownProvider {
        kind: &'static str,
        id: String,
        available: Vec<String>,
    },
}
