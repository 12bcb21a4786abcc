//! Object storage provider implementations

mod gcs;

pub use gcs::{GoogleCloudStorage, GoogleCloudStorageBucket};
