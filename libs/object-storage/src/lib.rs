//! # Object Storage Library
//!
//! Bucket and object operations behind two traits, with providers selected
//! by id from a registry:
//!
//! - [`ObjectStorageManager`]: list, create, inspect and delete buckets
//! - [`ObjectStorage`]: upload, download, list and delete objects in one bucket
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cloud_core::Environment;
//! use object_storage::{create_object_storage, default_object_storage_providers};
//!
//! let env = Environment::from_process();
//! let registry = default_object_storage_providers();
//! let manager = create_object_storage(&registry, "gcp-storage", &env).await?;
//!
//! if let Some(bucket) = manager.get("reports").await? {
//!     let (objects, folders) = bucket.list("2024/").await?;
//! }
//! ```

mod config;
mod error;
mod factory;
mod storage;
mod tags;
mod types;

pub mod providers;

pub use config::{
    GoogleCloudStorageConfig, DEFAULT_STORAGE_ENDPOINT, GCP_STORAGE_ENDPOINT,
    STORAGE_EMULATOR_HOST, STORAGE_PROVIDER,
};
pub use error::StorageError;
pub use factory::{
    create_object_storage, default_object_storage_providers, GoogleCloudStorageFactory,
    ObjectStorageFactory, ObjectStorageProviders, GOOGLE_CLOUD_STORAGE,
};
pub use storage::{ObjectStorage, ObjectStorageManager};
pub use tags::prepare_tags;
pub use types::{StorageArea, StoredObject, StoredPrefix};
