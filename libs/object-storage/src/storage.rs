//! Trait definitions for object storage providers

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;

use crate::{StorageArea, StorageError, StoredObject, StoredPrefix};

/// All buckets of one account or project
#[async_trait]
pub trait ObjectStorageManager: Send + Sync {
    /// Check whether a bucket exists
    async fn exists(&self, name: &str) -> Result<bool, StorageError>;

    /// List every bucket
    async fn list(&self) -> Result<Vec<StorageArea>, StorageError>;

    /// Get a bucket's description, `Ok(None)` if it does not exist
    async fn get_item(&self, name: &str) -> Result<Option<StorageArea>, StorageError>;

    /// Open an existing bucket, `Ok(None)` if it does not exist
    async fn get(&self, name: &str) -> Result<Option<Box<dyn ObjectStorage>>, StorageError>;

    /// Create a bucket and open it
    async fn create(
        &self,
        name: &str,
        open_to_public: bool,
        tags: &HashMap<String, String>,
    ) -> Result<Box<dyn ObjectStorage>, StorageError>;

    /// Delete a bucket
    async fn delete(&self, name: &str) -> Result<(), StorageError>;

    /// Get the provider name (for logging)
    fn name(&self) -> &'static str;
}

/// The objects of a single bucket
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Name of the bucket
    fn bucket(&self) -> &str;

    /// Write an object, replacing any previous content
    async fn upload(
        &self,
        key: &str,
        data: Bytes,
        tags: &HashMap<String, String>,
    ) -> Result<(), StorageError>;

    /// Check whether an object exists
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Read an object's content
    async fn download(&self, key: &str) -> Result<Bytes, StorageError>;

    /// Delete an object
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// List objects and sub-prefixes directly under `prefix` (delimiter `/`)
    async fn list(&self, prefix: &str)
        -> Result<(Vec<StoredObject>, Vec<StoredPrefix>), StorageError>;
}
