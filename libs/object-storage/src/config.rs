//! Configuration for storage providers

use std::time::Duration;

use cloud_core::gcp::{self, GcpCredentials};
use cloud_core::{ConfigError, Environment};

pub const STORAGE_PROVIDER: &str = "STORAGE_PROVIDER";
pub const GCP_STORAGE_ENDPOINT: &str = "GCP_STORAGE_ENDPOINT";
pub const STORAGE_EMULATOR_HOST: &str = "STORAGE_EMULATOR_HOST";

pub const DEFAULT_STORAGE_ENDPOINT: &str = "https://storage.googleapis.com";

/// Configuration for the Google Cloud Storage provider
#[derive(Debug, Clone)]
pub struct GoogleCloudStorageConfig {
    /// Project that owns the buckets
    pub project: String,
    pub credentials: GcpCredentials,
    /// API base URL; `/storage/v1` and `/upload/storage/v1` are appended
    pub endpoint: String,
    pub timeout: Duration,
}

impl GoogleCloudStorageConfig {
    pub fn new(project: impl Into<String>, credentials: GcpCredentials) -> Self {
        Self {
            project: project.into(),
            credentials,
            endpoint: DEFAULT_STORAGE_ENDPOINT.to_string(),
            timeout: Duration::from_secs(gcp::DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn from_env(env: &Environment) -> Result<Self, ConfigError> {
        let endpoint = env
            .get(GCP_STORAGE_ENDPOINT)
            .or_else(|| env.get(STORAGE_EMULATOR_HOST).map(with_scheme))
            .unwrap_or_else(|| DEFAULT_STORAGE_ENDPOINT.to_string());

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

// Emulator hosts are often given as bare `host:port`
fn with_scheme(host: String) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host
    } else {
        format!("http://{host}")
    }
}
