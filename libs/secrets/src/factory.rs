//! Provider factories and the default registries

use std::sync::Arc;

use async_trait::async_trait;
use cloud_core::{Environment, Registry};
use tracing::info;

use crate::providers::{EnvProvider, GcpSecretManager};
use crate::{
    CachedEnvironment, EnvironmentService, GcpSecretManagerConfig, SecretManagerEnvironment,
    SecretManagerEnvironmentConfig, SecretsError, SecretsProvider,
};

pub const GOOGLE_SECRETS_MANAGER: &str = "gcp-secrets";
pub const GOOGLE_SECRETS_MANAGER_CACHED: &str = "gcp-secrets-cached";
pub const ENV_PROVIDER: &str = "env";

/// Builds a secrets provider from configuration
#[async_trait]
pub trait SecretsProviderFactory: Send + Sync {
    async fn create(&self, env: &Environment) -> Result<Arc<dyn SecretsProvider>, SecretsError>;
}

/// Builds an environment service from configuration
#[async_trait]
pub trait EnvironmentServiceFactory: Send + Sync {
    async fn create(&self, env: &Environment)
        -> Result<Arc<dyn EnvironmentService>, SecretsError>;
}

pub type SecretProviders = Registry<dyn SecretsProviderFactory>;
pub type EnvironmentProviders = Registry<dyn EnvironmentServiceFactory>;

pub struct EnvProviderFactory;

#[async_trait]
impl SecretsProviderFactory for EnvProviderFactory {
    async fn create(&self, _env: &Environment) -> Result<Arc<dyn SecretsProvider>, SecretsError> {
        Ok(Arc::new(EnvProvider::new()))
    }
}

pub struct GcpSecretManagerFactory;

#[async_trait]
impl SecretsProviderFactory for GcpSecretManagerFactory {
    async fn create(&self, env: &Environment) -> Result<Arc<dyn SecretsProvider>, SecretsError> {
        let config = GcpSecretManagerConfig::from_env(env)?;
        info!(project = %config.project, "Google Secret Manager provider configured");
        Ok(Arc::new(GcpSecretManager::new(config)?))
    }
}

/// Secret Manager backed environment, optionally behind a read cache
pub struct SecretManagerEnvironmentFactory {
    cached: bool,
}

impl SecretManagerEnvironmentFactory {
    pub fn new() -> Self {
        Self { cached: false }
    }

    pub fn cached() -> Self {
        Self { cached: true }
    }
}

impl Default for SecretManagerEnvironmentFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EnvironmentServiceFactory for SecretManagerEnvironmentFactory {
    async fn create(
        &self,
        env: &Environment,
    ) -> Result<Arc<dyn EnvironmentService>, SecretsError> {
        let config = SecretManagerEnvironmentConfig::from_env(env)?;
        let vault: Arc<dyn SecretsProvider> =
            Arc::new(GcpSecretManager::new(config.secret_manager)?);
        let service: Arc<dyn EnvironmentService> =
            Arc::new(SecretManagerEnvironment::new(vault, config.prefix));

        if self.cached {
            Ok(Arc::new(CachedEnvironment::new(service)))
        } else {
            Ok(service)
        }
    }
}

/// Registry with every built-in secrets provider
pub fn default_secret_providers() -> SecretProviders {
    let mut registry: SecretProviders = Registry::new("secrets");
    registry.register(GOOGLE_SECRETS_MANAGER, Arc::new(GcpSecretManagerFactory));
    registry.register(ENV_PROVIDER, Arc::new(EnvProviderFactory));
    registry
}

/// Registry with every built-in environment service
pub fn default_environment_providers() -> EnvironmentProviders {
    let mut registry: EnvironmentProviders = Registry::new("environment");
    registry.register(
        GOOGLE_SECRETS_MANAGER,
        Arc::new(SecretManagerEnvironmentFactory::new()),
    );
    registry.register(
        GOOGLE_SECRETS_MANAGER_CACHED,
        Arc::new(SecretManagerEnvironmentFactory::cached()),
    );
    registry
}

/// Resolve `id` in `registry` and build the provider
pub async fn create_secrets_provider(
    registry: &SecretProviders,
    id: &str,
    env: &Environment,
) -> Result<Arc<dyn SecretsProvider>, SecretsError> {
    registry.resolve(id)?.create(env).await
}

/// Resolve `id` in `registry` and build the environment service
pub async fn create_environment_service(
    registry: &EnvironmentProviders,
    id: &str,
    env: &Environment,
) -> Result<Arc<dyn EnvironmentService>, SecretsError> {
    registry.resolve(id)?.create(env).await
}
