//! Environment services: named configuration values backed by a secrets provider

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use cloud_core::normalize_env_name;
use secrecy::{ExposeSecret, Secret};
use tokio::sync::RwLock;
use tracing::debug;

use crate::{SecretsError, SecretsProvider};

/// Source of named configuration values for a host application
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EnvironmentService: Send + Sync {
    /// Get a value by name; missing or empty values are `SecretsError::NotFound`
    async fn get(&self, name: &str) -> Result<Secret<String>, SecretsError>;

    /// Store every item, stopping at the first failure
    async fn save_all(&self, items: &HashMap<String, String>) -> Result<(), SecretsError>;
}

/// Environment service whose values live in a secrets provider
pub struct SecretManagerEnvironment {
    vault: Arc<dyn SecretsProvider>,
    prefix: Option<String>,
}

impl SecretManagerEnvironment {
    pub fn new(vault: Arc<dyn SecretsProvider>, prefix: Option<String>) -> Self {
        let prefix = prefix
            .map(|p| normalize_env_name(&p))
            .filter(|p| !p.is_empty());
        Self { vault, prefix }
    }

    /// Secret key for a setting name: `PREFIX_NAME`, or `NAME` without a prefix
    pub fn secret_key(&self, name: &str) -> String {
        let name = normalize_env_name(name);
        match self.prefix {
            Some(ref prefix) => format!("{prefix}_{name}"),
            None => name,
        }
    }
}

#[async_trait]
impl EnvironmentService for SecretManagerEnvironment {
    async fn get(&self, name: &str) -> Result<Secret<String>, SecretsError> {
        let key = self.secret_key(name);

        match self.vault.get_secret(&key).await? {
            Some(value) if !value.expose_secret().is_empty() => Ok(value),
            _ => Err(SecretsError::NotFound(name.to_string())),
        }
    }

    async fn save_all(&self, items: &HashMap<String, String>) -> Result<(), SecretsError> {
        for (name, value) in items {
            let key = self.secret_key(name);
            self.vault.save_secret(&key, value).await?;
            debug!(key = %key, provider = self.vault.name(), "Environment value saved");
        }
        Ok(())
    }
}

/// Caches successful reads of another environment service
pub struct CachedEnvironment {
    inner: Arc<dyn EnvironmentService>,
    cache: RwLock<HashMap<String, Secret<String>>>,
}

impl CachedEnvironment {
    pub fn new(inner: Arc<dyn EnvironmentService>) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Clear the cache (useful for secret rotation)
    pub async fn clear(&self) {
        self.cache.write().await.clear();
        debug!("Environment cache cleared");
    }

    /// Invalidate a specific cached value
    pub async fn invalidate(&self, name: &str) {
        self.cache.write().await.remove(&normalize_env_name(name));
    }
}

#[async_trait]
impl EnvironmentService for CachedEnvironment {
    async fn get(&self, name: &str) -> Result<Secret<String>, SecretsError> {
        let cache_key = normalize_env_name(name);

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(&cache_key) {
                debug!(name = %name, "Environment value retrieved from cache");
                return Ok(Secret::new(cached.expose_secret().clone()));
            }
        }

        let value = self.inner.get(name).await?;

        self.cache
            .write()
            .await
            .insert(cache_key, Secret::new(value.expose_secret().clone()));
        Ok(value)
    }

    async fn save_all(&self, items: &HashMap<String, String>) -> Result<(), SecretsError> {
        self.inner.save_all(items).await?;

        let mut cache = self.cache.write().await;
        for (name, value) in items {
            let cache_key = normalize_env_name(name);
            // Empty values read back as NotFound
            if value.is_empty() {
                cache.remove(&cache_key);
            } else {
                cache.insert(cache_key, Secret::new(value.clone()));
            }
        }
        Ok(())
    }
}
