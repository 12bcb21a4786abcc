//! Environment variable secrets provider

use async_trait::async_trait;
use secrecy::Secret;

use crate::{SecretsError, SecretsProvider};

/// Provider that reads secrets from environment variables.
/// Read-only: saving or deleting is refused.
pub struct EnvProvider;

impl EnvProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EnvProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretsProvider for EnvProvider {
    async fn get_secret(&self, key: &str) -> Result<Option<Secret<String>>, SecretsError> {
        match std::env::var(key) {
            Ok(value) if !value.is_empty() => Ok(Some(Secret::new(value))),
            Ok(_) => Ok(None), // Empty value treated as not found
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretsError::EnvError(format!(
                "Environment variable '{key}' contains invalid UTF-8"
            ))),
        }
    }

    async fn save_secret_binary(&self, _key: &str, _value: &[u8]) -> Result<(), SecretsError> {
        Err(SecretsError::Unsupported {
            provider: self.name(),
            operation: "save",
        })
    }

    async fn delete_secret(&self, _key: &str) -> Result<(), SecretsError> {
        Err(SecretsError::Unsupported {
            provider: self.name(),
            operation: "delete",
        })
    }

    fn name(&self) -> &'static str {
        "environment"
    }
}
