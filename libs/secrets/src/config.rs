//! Configuration for secrets providers

use std::time::Duration;

use cloud_core::gcp::{self, GcpCredentials};
use cloud_core::{ConfigError, Environment};

pub const SECRETS_PROVIDER: &str = "SECRETS_PROVIDER";
pub const SECRETS_CACHE_ENABLED: &str = "SECRETS_CACHE_ENABLED";
pub const GCP_SECRET_MANAGER_ENDPOINT: &str = "GCP_SECRET_MANAGER_ENDPOINT";
pub const SECRETS_PREFIX: &str = "prefix";

pub const DEFAULT_SECRET_MANAGER_ENDPOINT: &str = "https://secretmanager.googleapis.com";

/// Configuration for the secrets client
#[derive(Debug, Clone, Default)]
pub struct SecretsConfig {
    /// Registry id of the primary provider; `None` means environment variables only
    pub provider: Option<String>,
    /// Whether to cache secrets in memory
    pub cache_enabled: bool,
}

impl SecretsConfig {
    /// Load configuration from environment variables
    pub fn from_env(env: &Environment) -> Self {
        Self {
            provider: env.get(SECRETS_PROVIDER),
            cache_enabled: env.get_flag(SECRETS_CACHE_ENABLED, true),
        }
    }

    /// Create a config for env-only mode (no external provider)
    pub fn env_only() -> Self {
        Self {
            provider: None,
            cache_enabled: false,
        }
    }
}

/// Configuration for the Google Secret Manager provider
#[derive(Debug, Clone)]
pub struct GcpSecretManagerConfig {
    /// Project that owns the secrets
    pub project: String,
    pub credentials: GcpCredentials,
    /// API base URL, without the `/v1` suffix
    pub endpoint: String,
    pub timeout: Duration,
}

impl GcpSecretManagerConfig {
    pub fn new(project: impl Into<String>, credentials: GcpCredentials) -> Self {
        Self {
            project: project.into(),
            credentials,
            endpoint: DEFAULT_SECRET_MANAGER_ENDPOINT.to_string(),
            timeout: Duration::from_secs(gcp::DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn from_env(env: &Environment) -> Result<Self, ConfigError> {
        let endpoint = env.get_or(GCP_SECRET_MANAGER_ENDPOINT, DEFAULT_SECRET_MANAGER_ENDPOINT);

        Ok(Self {
            project: env.force(gcp::GCP_PROJECT)?,
            credentials: GcpCredentials::from_env(env),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout: gcp::timeout_from_env(env)?,
        })
    }

    /// Point the provider at a different API host (emulators, tests)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }
}

/// Configuration for the Secret Manager backed environment service
#[derive(Debug, Clone)]
pub struct SecretManagerEnvironmentConfig {
    pub secret_manager: GcpSecretManagerConfig,
    /// Namespace prepended to every secret id
    pub prefix: Option<String>,
}

impl SecretManagerEnvironmentConfig {
    pub fn from_env(env: &Environment) -> Result<Self, ConfigError> {
        Ok(Self {
            secret_manager: GcpSecretManagerConfig::from_env(env)?,
            prefix: env.get(SECRETS_PREFIX),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_config_defaults() {
        let config = SecretsConfig::from_env(&Environment::from_map(Vec::<(&str, &str)>::new()));

        assert!(config.provider.is_none());
        assert!(config.cache_enabled);
    }

    #[test]
    fn test_secrets_config_from_env() {
        let env = Environment::from_map([
            (SECRETS_PROVIDER, "gcp-secrets"),
            (SECRETS_CACHE_ENABLED, "false"),
        ]);
        let config = SecretsConfig::from_env(&env);

        assert_eq!(config.provider.as_deref(), Some("gcp-secrets"));
        assert!(!config.cache_enabled);
    }

    #[test]
    fn test_secret_manager_requires_project() {
        let env = Environment::from_map([("GCP_ACCESS_TOKEN", "t")]);

        assert_eq!(
            GcpSecretManagerConfig::from_env(&env).unwrap_err(),
            ConfigError::Missing("GCP_PROJECT".to_string())
        );
    }

    #[test]
    fn test_secret_manager_config_from_env() {
        let env = Environment::from_map([
            ("GCP_PROJECT", "demo"),
            (GCP_SECRET_MANAGER_ENDPOINT, "http://localhost:9090/"),
            ("GCP_HTTP_TIMEOUT_SECS", "3"),
            ("PREFIX", "billing"),
        ]);

        let config = SecretManagerEnvironmentConfig::from_env(&env).unwrap();
        assert_eq!(config.secret_manager.project, "demo");
        assert_eq!(config.secret_manager.endpoint, "http://localhost:9090");
        assert_eq!(config.secret_manager.timeout, Duration::from_secs(3));
        assert_eq!(config.prefix.as_deref(), Some("billing"));
    }
}
