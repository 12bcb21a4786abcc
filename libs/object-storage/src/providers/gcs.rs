//! Google Cloud Storage provider
//!
//! Uses the Cloud Storage JSON API v1. [`GoogleCloudStorage`] manages the
//! buckets of a project; each [`GoogleCloudStorageBucket`] handles the
//! objects of one bucket. Both share a single HTTP client and token cache.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use cloud_core::gcp::{self, AccessTokenProvider, ApiError};
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::{
    prepare_tags, GoogleCloudStorageConfig, ObjectStorage, ObjectStorageManager, StorageArea,
    StorageError, StoredObject, StoredPrefix,
};

const DELIMITER: &str = "/";
const PUBLIC_READ: &str = "publicRead";

#[derive(Debug, Deserialize)]
struct BucketResource {
    name: String,
    #[serde(default)]
    labels: HashMap<String, String>,
}

impl From<BucketResource> for StorageArea {
    fn from(bucket: BucketResource) -> Self {
        StorageArea {
            name: bucket.name,
            tags: bucket.labels,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BucketList {
    #[serde(default)]
    items: Vec<BucketResource>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectResource {
    name: String,
    // uint64 is sent as a JSON string
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    md5_hash: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl TryFrom<ObjectResource> for StoredObject {
    type Error = StorageError;

    fn try_from(object: ObjectResource) -> Result<Self, Self::Error> {
        let size = match object.size {
            Some(ref size) => size.parse::<u64>().map_err(|_| {
                StorageError::DecodeError(format!(
                    "object '{}' has invalid size '{size}'",
                    object.name
                ))
            })?,
            None => 0,
        };

        Ok(StoredObject {
            key: object.name,
            tags: object.metadata,
            size,
            md5: object.md5_hash.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectResource>,
    #[serde(default)]
    prefixes: Vec<String>,
    next_page_token: Option<String>,
}

fn require_name(kind: &str, name: &str) -> Result<(), StorageError> {
    if name.is_empty() {
        return Err(StorageError::InvalidConfig(format!(
            "{kind} name must not be empty"
        )));
    }
    Ok(())
}

/// HTTP plumbing shared by the manager and its buckets
struct GcsClient {
    config: GoogleCloudStorageConfig,
    http: Client,
    tokens: AccessTokenProvider,
}

impl GcsClient {
    fn bucket_url(&self, bucket: &str) -> String {
        format!(
            "{}/storage/v1/b/{}",
            self.config.endpoint,
            urlencoding::encode(bucket)
        )
    }

    fn buckets_url(&self) -> String {
        format!("{}/storage/v1/b", self.config.endpoint)
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/o/{}", self.bucket_url(bucket), urlencoding::encode(key))
    }

    fn upload_url(&self, bucket: &str) -> String {
        format!(
            "{}/upload/storage/v1/b/{}/o",
            self.config.endpoint,
            urlencoding::encode(bucket)
        )
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StorageError> {
        let token = self.tokens.token().await?;

        request
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))
    }

    async fn error_for(&self, what: &str, response: Response) -> StorageError {
        let err = ApiError::from_response(response).await;

        match err.status {
            StatusCode::NOT_FOUND => StorageError::NotFound(what.to_string()),
            StatusCode::CONFLICT => StorageError::AlreadyExists(what.to_string()),
            StatusCode::UNAUTHORIZED => {
                self.tokens.invalidate().await;
                StorageError::AuthenticationFailed(err.message)
            }
            StatusCode::FORBIDDEN => {
                StorageError::PermissionDenied(format!("{what}: {}", err.message))
            }
            StatusCode::TOO_MANY_REQUESTS => StorageError::RateLimited(err.message),
            _ => StorageError::Internal(format!("{what}: {err}")),
        }
    }

    /// GET a resource, mapping 404 to `None`
    async fn get_optional(
        &self,
        what: &str,
        url: String,
    ) -> Result<Option<Response>, StorageError> {
        let response = self.send(self.http.get(url)).await?;

        match response.status() {
            status if status.is_success() => Ok(Some(response)),
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(self.error_for(what, response).await),
        }
    }

    /// Send a request that only needs to succeed
    async fn expect_success(
        &self,
        what: &str,
        request: RequestBuilder,
    ) -> Result<Response, StorageError> {
        let response = self.send(request).await?;

        if !response.status().is_success() {
            return Err(self.error_for(what, response).await);
        }
        Ok(response)
    }
}

/// Google Cloud Storage provider: all buckets of a project
pub struct GoogleCloudStorage {
    client: Arc<GcsClient>,
}

impl GoogleCloudStorage {
    pub fn new(config: GoogleCloudStorageConfig) -> Result<Self, StorageError> {
        let http = gcp::http_client(config.timeout)
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;
        let tokens = AccessTokenProvider::new(http.clone(), config.credentials.clone());

        Ok(Self {
            client: Arc::new(GcsClient {
                config,
                http,
                tokens,
            }),
        })
    }

    pub fn project(&self) -> &str {
        &self.client.config.project
    }

    /// Handle on a bucket without checking that it exists
    pub fn bucket(&self, name: &str) -> GoogleCloudStorageBucket {
        GoogleCloudStorageBucket {
            client: self.client.clone(),
            bucket: name.to_string(),
        }
    }
}

#[async_trait]
impl ObjectStorageManager for GoogleCloudStorage {
    async fn exists(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.get_item(name).await?.is_some())
    }

    async fn list(&self) -> Result<Vec<StorageArea>, StorageError> {
        let mut areas = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .http
                .get(self.client.buckets_url())
                .query(&[("project", self.project())]);
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: BucketList = self
                .client
                .expect_success("buckets", request)
                .await?
                .json()
                .await?;

            areas.extend(page.items.into_iter().map(StorageArea::from));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(areas)
    }

    async fn get_item(&self, name: &str) -> Result<Option<StorageArea>, StorageError> {
        require_name("bucket", name)?;

        let Some(response) = self
            .client
            .get_optional(name, self.client.bucket_url(name))
            .await?
        else {
            debug!(bucket = %name, "Bucket does not exist");
            return Ok(None);
        };

        let bucket: BucketResource = response.json().await?;
        Ok(Some(bucket.into()))
    }

    async fn get(&self, name: &str) -> Result<Option<Box<dyn ObjectStorage>>, StorageError> {
        if !self.exists(name).await? {
            return Ok(None);
        }
        Ok(Some(Box::new(self.bucket(name))))
    }

    async fn create(
        &self,
        name: &str,
        open_to_public: bool,
        tags: &HashMap<String, String>,
    ) -> Result<Box<dyn ObjectStorage>, StorageError> {
        require_name("bucket", name)?;

        let mut request = self
            .client
            .http
            .post(self.client.buckets_url())
            .query(&[("project", self.project())]);
        if open_to_public {
            request = request.query(&[
                ("predefinedAcl", PUBLIC_READ),
                ("predefinedDefaultObjectAcl", PUBLIC_READ),
            ]);
        }
        let body = json!({ "name": name, "labels": prepare_tags(tags) });

        self.client.expect_success(name, request.json(&body)).await?;
        info!(bucket = %name, public = open_to_public, "Bucket created");

        Ok(Box::new(self.bucket(name)))
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        require_name("bucket", name)?;

        let request = self.client.http.delete(self.client.bucket_url(name));
        self.client.expect_success(name, request).await?;

        info!(bucket = %name, "Bucket deleted");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "gcp-storage"
    }
}

/// The objects of one Google Cloud Storage bucket
pub struct GoogleCloudStorageBucket {
    client: Arc<GcsClient>,
    bucket: String,
}

impl GoogleCloudStorageBucket {
    fn describe(&self, key: &str) -> String {
        format!("gs://{}/{}", self.bucket, key)
    }

    fn require_key(&self, key: &str) -> Result<(), StorageError> {
        require_name("bucket", &self.bucket)?;
        require_name("object", key)
    }
}

#[async_trait]
impl ObjectStorage for GoogleCloudStorageBucket {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload(
        &self,
        key: &str,
        data: Bytes,
        tags: &HashMap<String, String>,
    ) -> Result<(), StorageError> {
        self.require_key(key)?;
        let what = self.describe(key);
        let size = data.len();

        let request = self
            .client
            .http
            .post(self.client.upload_url(&self.bucket))
            .query(&[("uploadType", "media"), ("name", key)])
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(data);
        self.client.expect_success(&what, request).await?;

        let metadata = prepare_tags(tags);
        if !metadata.is_empty() {
            let request = self
                .client
                .http
                .patch(self.client.object_url(&self.bucket, key))
                .json(&json!({ "metadata": metadata }));
            self.client.expect_success(&what, request).await?;
        }

        debug!(object = %what, size, "Object uploaded");
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        self.require_key(key)?;
        let what = self.describe(key);
        let response = self
            .client
            .get_optional(&what, self.client.object_url(&self.bucket, key))
            .await?;
        Ok(response.is_some())
    }

    async fn download(&self, key: &str) -> Result<Bytes, StorageError> {
        self.require_key(key)?;
        let what = self.describe(key);
        let request = self
            .client
            .http
            .get(self.client.object_url(&self.bucket, key))
            .query(&[("alt", "media")]);

        let response = self.client.expect_success(&what, request).await?;
        Ok(response.bytes().await?)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.require_key(key)?;
        let what = self.describe(key);
        let request = self
            .client
            .http
            .delete(self.client.object_url(&self.bucket, key));
        self.client.expect_success(&what, request).await?;

        debug!(object = %what, "Object deleted");
        Ok(())
    }

    async fn list(
        &self,
        prefix: &str,
    ) -> Result<(Vec<StoredObject>, Vec<StoredPrefix>), StorageError> {
        require_name("bucket", &self.bucket)?;

        let mut objects = Vec::new();
        let mut prefixes = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .http
                .get(format!("{}/o", self.client.bucket_url(&self.bucket)))
                .query(&[("prefix", prefix), ("delimiter", DELIMITER)]);
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: ObjectList = self
                .client
                .expect_success(&self.describe(prefix), request)
                .await?
                .json()
                .await?;

            for item in page.items {
                objects.push(StoredObject::try_from(item)?);
            }
            prefixes.extend(page.prefixes.into_iter().map(|key| StoredPrefix { key }));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok((objects, prefixes))
    }
}
