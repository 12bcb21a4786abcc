//! # Secrets Management Library
//!
//! A secrets management abstraction with pluggable providers, selected by id
//! from a registry, and automatic fallback to environment variables.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     SecretsClient                           │
//! │  ┌─────────────────────────────────────────────────────┐   │
//! │  │  1. Check the in-memory cache (if enabled)          │   │
//! │  │  2. Try the configured provider (e.g. gcp-secrets)  │   │
//! │  │  3. If missing → Try Environment Variable           │   │
//! │  └─────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cloud_core::Environment;
//! use secrets::{default_secret_providers, SecretsClient, SecretsConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), secrets::SecretsError> {
//!     let env = Environment::from_process();
//!     let registry = default_secret_providers();
//!     let client = SecretsClient::new(SecretsConfig::from_env(&env), &registry, &env).await;
//!
//!     let db_password = client.get_secret("DATABASE_PASSWORD").await?;
//!     let optional = client.get_secret_optional("OPTIONAL_KEY").await;
//!     Ok(())
//! }
//! ```

mod config;
mod environment;
mod error;
mod factory;
mod provider;

pub mod providers;

pub use config::{
    GcpSecretManagerConfig, SecretManagerEnvironmentConfig, SecretsConfig,
    DEFAULT_SECRET_MANAGER_ENDPOINT, GCP_SECRET_MANAGER_ENDPOINT, SECRETS_CACHE_ENABLED,
    SECRETS_PROVIDER,
};
pub use environment::{CachedEnvironment, EnvironmentService, SecretManagerEnvironment};
pub use error::SecretsError;
pub use factory::{
    create_environment_service, create_secrets_provider, default_environment_providers,
    default_secret_providers, EnvProviderFactory, EnvironmentProviders,
    EnvironmentServiceFactory, GcpSecretManagerFactory, SecretManagerEnvironmentFactory,
    SecretProviders, SecretsProviderFactory, ENV_PROVIDER, GOOGLE_SECRETS_MANAGER,
    GOOGLE_SECRETS_MANAGER_CACHED,
};
pub use provider::SecretsProvider;

use cloud_core::Environment;
use providers::EnvProvider;
use secrecy::{ExposeSecret, Secret};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Main client for accessing secrets with automatic fallback
pub struct SecretsClient {
    /// Primary provider (e.g., Google Secret Manager)
    primary: Option<Arc<dyn SecretsProvider>>,
    /// Fallback provider (environment variables)
    fallback: Arc<dyn SecretsProvider>,
    /// Cache for secrets (optional, reduces API calls)
    cache: Arc<RwLock<HashMap<String, Secret<String>>>>,
    /// Whether caching is enabled
    cache_enabled: bool,
}

impl SecretsClient {
    /// Create a new secrets client, resolving the configured provider in `registry`
    pub async fn new(config: SecretsConfig, registry: &SecretProviders, env: &Environment) -> Self {
        let primary = match config.provider.as_deref() {
            Some(id) => match create_secrets_provider(registry, id, env).await {
                Ok(provider) => {
                    info!(provider = %id, "Secrets provider initialized successfully");
                    Some(provider)
                }
                Err(e) => {
                    warn!(
                        provider = %id,
                        error = %e,
                        "Failed to initialize secrets provider, will use env vars only"
                    );
                    None
                }
            },
            None => {
                debug!("No secrets provider configured, using environment variables only");
                None
            }
        };

        Self::with_provider(primary, config.cache_enabled)
    }

    /// Create a client around an already-built provider
    pub fn with_provider(primary: Option<Arc<dyn SecretsProvider>>, cache_enabled: bool) -> Self {
        Self {
            primary,
            fallback: Arc::new(EnvProvider::new()),
            cache: Arc::new(RwLock::new(HashMap::new())),
            cache_enabled,
        }
    }

    /// Create a client that only uses environment variables (for testing/simple setups)
    pub fn env_only() -> Self {
        Self::with_provider(None, false)
    }

    /// Get a secret by key, failing with `SecretsError::NotFound` if no provider has it.
    ///
    /// Order of resolution:
    /// 1. Check cache (if enabled)
    /// 2. Try primary provider
    /// 3. Try fallback provider (environment variables)
    pub async fn get_secret(&self, key: &str) -> Result<Secret<String>, SecretsError> {
        self.get_secret_optional(key)
            .await
            .ok_or_else(|| SecretsError::NotFound(key.to_string()))
    }

    /// Get a secret by key, returning None if not found
    pub async fn get_secret_optional(&self, key: &str) -> Option<Secret<String>> {
        // Check cache first
        if self.cache_enabled {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(key) {
                debug!(key = %key, "Secret retrieved from cache");
                return Some(Secret::new(cached.expose_secret().clone()));
            }
        }

        if let Some(ref primary) = self.primary {
            match primary.get_secret(key).await {
                Ok(Some(value)) => {
                    debug!(key = %key, provider = primary.name(), "Secret retrieved");
                    self.cache_secret(key, &value).await;
                    return Some(value);
                }
                Ok(None) => {
                    debug!(key = %key, provider = primary.name(), "Secret not found, trying fallback");
                }
                Err(e) => {
                    warn!(
                        key = %key,
                        provider = primary.name(),
                        error = %e,
                        "Failed to get secret, trying fallback"
                    );
                }
            }
        }

        // Try fallback provider (env vars)
        match self.fallback.get_secret(key).await {
            Ok(Some(value)) => {
                debug!(key = %key, provider = "env", "Secret retrieved from environment");
                self.cache_secret(key, &value).await;
                Some(value)
            }
            Ok(None) => {
                debug!(key = %key, "Secret not found in any provider");
                None
            }
            Err(e) => {
                error!(key = %key, error = %e, "Failed to get secret from environment");
                None
            }
        }
    }

    /// Get a secret and expose its value (convenience method)
    pub async fn get_secret_value(&self, key: &str) -> Result<String, SecretsError> {
        Ok(self.get_secret(key).await?.expose_secret().clone())
    }

    /// Get an optional secret's value
    pub async fn get_secret_value_optional(&self, key: &str) -> Option<String> {
        self.get_secret_optional(key)
            .await
            .map(|s| s.expose_secret().clone())
    }

    /// Check if a secret exists in any provider
    pub async fn has_secret(&self, key: &str) -> bool {
        self.get_secret_optional(key).await.is_some()
    }

    /// Store a secret in the primary provider
    pub async fn save_secret(&self, key: &str, value: &str) -> Result<(), SecretsError> {
        self.primary()?.save_secret(key, value).await?;
        self.invalidate(key).await;
        Ok(())
    }

    /// Delete a secret from the primary provider
    pub async fn delete_secret(&self, key: &str) -> Result<(), SecretsError> {
        self.primary()?.delete_secret(key).await?;
        self.invalidate(key).await;
        Ok(())
    }

    fn primary(&self) -> Result<&Arc<dyn SecretsProvider>, SecretsError> {
        self.primary.as_ref().ok_or_else(|| {
            SecretsError::ProviderUnavailable("no writable secrets provider configured".to_string())
        })
    }

    /// Clear the cache (useful for secret rotation)
    pub async fn clear_cache(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();
        info!("Secrets cache cleared");
    }

    /// Invalidate a specific cached secret
    pub async fn invalidate(&self, key: &str) {
        let mut cache = self.cache.write().await;
        cache.remove(key);
        debug!(key = %key, "Secret invalidated from cache");
    }

    /// Cache a secret value
    async fn cache_secret(&self, key: &str, value: &Secret<String>) {
        if self.cache_enabled {
            let mut cache = self.cache.write().await;
            cache.insert(key.to_string(), Secret::new(value.expose_secret().clone()));
        }
    }

    /// Check if a primary provider is available
    pub fn has_primary_provider(&self) -> bool {
        self.primary.is_some()
    }
}
