//! Values returned by storage providers

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A bucket (or container) and its labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageArea {
    pub name: String,
    pub tags: HashMap<String, String>,
}

/// An object in a bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub key: String,
    pub tags: HashMap<String, String>,
    pub size: u64,
    /// Content hash as reported by the provider (base64 MD5 for GCS)
    pub md5: String,
}

/// A "folder": common prefix of several keys under the `/` delimiter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPrefix {
    pub key: String,
}
