//! Provider factories and the default registry

use std::sync::Arc;

use async_trait::async_trait;
use cloud_core::{Environment, Registry};
use tracing::info;

use crate::providers::GoogleCloudStorage;
use crate::{GoogleCloudStorageConfig, ObjectStorageManager, StorageError};

pub const GOOGLE_CLOUD_STORAGE: &str = "gcp-storage";

/// Builds an object storage manager from configuration
#[async_trait]
pub trait ObjectStorageFactory: Send + Sync {
    async fn create(&self, env: &Environment)
        -> Result<Arc<dyn ObjectStorageManager>, StorageError>;
}

pub type ObjectStorageProviders = Registry<dyn ObjectStorageFactory>;

pub struct GoogleCloudStorageFactory;

#[async_trait]
impl ObjectStorageFactory for GoogleCloudStorageFactory {
    async fn create(
        &self,
        env: &Environment,
    ) -> Result<Arc<dyn ObjectStorageManager>, StorageError> {
        let config = GoogleCloudStorageConfig::from_env(env)?;
        info!(project = %config.project, "Google Cloud Storage provider configured");
        Ok(Arc::new(GoogleCloudStorage::new(config)?))
    }
}

/// Registry with every built-in object storage provider
pub fn default_object_storage_providers() -> ObjectStorageProviders {
    let mut registry: ObjectStorageProviders = Registry::new("object storage");
    registry.register(GOOGLE_CLOUD_STORAGE, Arc::new(GoogleCloudStorageFactory));
    registry
}

/// Resolve `id` in `registry` and build the storage manager
pub async fn create_object_storage(
    registry: &ObjectStorageProviders,
    id: &str,
    env: &Environment,
) -> Result<Arc<dyn ObjectStorageManager>, StorageError> {
    registry.resolve(id)?.create(env).await
}
