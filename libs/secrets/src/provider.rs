//! Trait definition for secrets providers

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret, SecretVec};

use crate::SecretsError;

/// Trait for secrets providers
///
/// Implement this trait to add support for new secrets backends.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SecretsProvider: Send + Sync {
    /// Get a secret by key
    ///
    /// Returns `Ok(Some(secret))` if found, `Ok(None)` if not found,
    /// or `Err` if there was an error accessing the provider.
    async fn get_secret(&self, key: &str) -> Result<Option<Secret<String>>, SecretsError>;

    /// Get a secret's raw bytes by key
    async fn get_secret_binary(&self, key: &str) -> Result<Option<SecretVec<u8>>, SecretsError> {
        Ok(self
            .get_secret(key)
            .await?
            .map(|s| SecretVec::new(s.expose_secret().as_bytes().to_vec())))
    }

    /// Store a secret, creating it if needed
    async fn save_secret(&self, key: &str, value: &str) -> Result<(), SecretsError> {
        self.save_secret_binary(key, value.as_bytes()).await
    }

    /// Store raw bytes as a secret, creating it if needed
    async fn save_secret_binary(&self, key: &str, value: &[u8]) -> Result<(), SecretsError>;

    /// Delete a secret and all of its versions
    async fn delete_secret(&self, key: &str) -> Result<(), SecretsError>;

    /// Get the provider name (for logging)
    fn name(&self) -> &'static str;

    /// Check if the provider is healthy/reachable
    async fn health_check(&self) -> Result<(), SecretsError> {
        Ok(())
    }
}
