//! Google Cloud Secret Manager provider
//!
//! Talks to the Secret Manager v1 REST API. Secret Manager separates the
//! secret (a named container with a replication policy) from its versions
//! (the payloads), so saving is "create the secret if missing, then add a
//! version", and reading always accesses the `latest` version.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use cloud_core::gcp::{self, AccessTokenProvider, ApiError};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, Secret, SecretVec};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::{GcpSecretManagerConfig, SecretsError, SecretsProvider};

const LATEST_VERSION: &str = "latest";
const MAX_SECRET_ID_LEN: usize = 255;

/// Make `key` a valid secret id: `[A-Za-z0-9_-]{1,255}`.
/// Other characters become `-`.
pub fn sanitize_secret_id(key: &str) -> String {
    let mut id: String = key
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '-',
        })
        .collect();
    id.truncate(MAX_SECRET_ID_LEN);
    id
}

#[derive(Debug, Deserialize)]
struct AccessSecretVersionResponse {
    payload: Option<SecretPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecretPayload {
    #[serde(default)]
    data: String,
    // int64 is sent as a JSON string, but accept numbers too
    #[serde(default)]
    data_crc32c: Option<Value>,
}

impl SecretPayload {
    fn checksum(&self) -> Option<i64> {
        match self.data_crc32c.as_ref()? {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }
}

fn crc32c_of(data: &[u8]) -> i64 {
    i64::from(crc32c::crc32c(data))
}

/// Google Cloud Secret Manager provider
pub struct GcpSecretManager {
    config: GcpSecretManagerConfig,
    http: Client,
    tokens: AccessTokenProvider,
}

impl GcpSecretManager {
    pub fn new(config: GcpSecretManagerConfig) -> Result<Self, SecretsError> {
        let http = gcp::http_client(config.timeout)
            .map_err(|e| SecretsError::ConnectionFailed(e.to_string()))?;
        let tokens = AccessTokenProvider::new(http.clone(), config.credentials.clone());

        Ok(Self {
            config,
            http,
            tokens,
        })
    }

    pub fn project(&self) -> &str {
        &self.config.project
    }

    fn secret_id(&self, key: &str) -> Result<String, SecretsError> {
        let id = sanitize_secret_id(key);
        if id.is_empty() {
            return Err(SecretsError::InvalidConfig(
                "secret key must not be empty".to_string(),
            ));
        }
        Ok(id)
    }

    /// `projects/{project}/secrets/{id}`
    pub fn secret_name(&self, key: &str) -> Result<String, SecretsError> {
        Ok(format!(
            "projects/{}/secrets/{}",
            self.config.project,
            self.secret_id(key)?
        ))
    }

    /// `projects/{project}/secrets/{id}/versions/{version}`, defaulting to `latest`
    pub fn secret_version_name(
        &self,
        key: &str,
        version: Option<&str>,
    ) -> Result<String, SecretsError> {
        let version = version.filter(|v| !v.is_empty()).unwrap_or(LATEST_VERSION);
        Ok(format!("{}/versions/{}", self.secret_name(key)?, version))
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/v1/{}", self.config.endpoint, resource)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, SecretsError> {
        let token = self.tokens.token().await?;

        request
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|e| SecretsError::ConnectionFailed(e.to_string()))
    }

    async fn error_for(&self, key: &str, response: Response) -> SecretsError {
        let err = ApiError::from_response(response).await;

        match err.status {
            StatusCode::NOT_FOUND => SecretsError::NotFound(key.to_string()),
            StatusCode::UNAUTHORIZED => {
                self.tokens.invalidate().await;
                SecretsError::AuthenticationFailed(err.message)
            }
            StatusCode::FORBIDDEN => {
                SecretsError::PermissionDenied(format!("'{key}': {}", err.message))
            }
            StatusCode::TOO_MANY_REQUESTS => SecretsError::RateLimited(err.message),
            _ => SecretsError::Internal(err.to_string()),
        }
    }

    async fn secret_exists(&self, key: &str, name: &str) -> Result<bool, SecretsError> {
        let response = self.send(self.http.get(self.url(name))).await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(self.error_for(key, response).await),
        }
    }

    async fn create_secret(&self, key: &str, id: &str) -> Result<(), SecretsError> {
        let url = format!(
            "{}?secretId={}",
            self.url(&format!("projects/{}/secrets", self.config.project)),
            urlencoding::encode(id)
        );
        let body = json!({ "replication": { "automatic": {} } });

        let response = self.send(self.http.post(url).json(&body)).await?;

        match response.status() {
            status if status.is_success() => {
                debug!(key = %key, secret_id = %id, "Created secret");
                Ok(())
            }
            // Lost a race with another writer; the secret is there either way
            StatusCode::CONFLICT => Ok(()),
            _ => Err(self.error_for(key, response).await),
        }
    }

    async fn add_version(&self, key: &str, name: &str, data: &[u8]) -> Result<(), SecretsError> {
        let body = json!({
            "payload": {
                "data": STANDARD.encode(data),
                "dataCrc32c": crc32c_of(data).to_string(),
            }
        });

        let response = self
            .send(self.http.post(self.url(&format!("{name}:addVersion"))).json(&body))
            .await?;

        if !response.status().is_success() {
            return Err(self.error_for(key, response).await);
        }
        Ok(())
    }
}

#[async_trait]
impl SecretsProvider for GcpSecretManager {
    async fn get_secret(&self, key: &str) -> Result<Option<Secret<String>>, SecretsError> {
        let Some(bytes) = self.get_secret_binary(key).await? else {
            return Ok(None);
        };

        let value = String::from_utf8(bytes.expose_secret().clone())
            .map_err(|_| SecretsError::DecodeError(format!("secret '{key}' is not valid UTF-8")))?;
        Ok(Some(Secret::new(value)))
    }

    async fn get_secret_binary(&self, key: &str) -> Result<Option<SecretVec<u8>>, SecretsError> {
        let name = self.secret_version_name(key, None)?;
        let response = self
            .send(self.http.get(self.url(&format!("{name}:access"))))
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(key = %key, provider = "gcp-secrets", "Secret not found");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(self.error_for(key, response).await);
        }

        let body: AccessSecretVersionResponse = response.json().await?;
        let Some(payload) = body.payload else {
            return Err(SecretsError::DecodeError(format!(
                "secret '{key}' has no payload"
            )));
        };

        let data = STANDARD
            .decode(payload.data.as_bytes())
            .map_err(|e| SecretsError::DecodeError(e.to_string()))?;

        if let Some(expected) = payload.checksum() {
            if crc32c_of(&data) != expected {
                warn!(key = %key, "Secret payload checksum mismatch");
                return Err(SecretsError::DataCorruption(key.to_string()));
            }
        }

        Ok(Some(SecretVec::new(data)))
    }

    async fn save_secret_binary(&self, key: &str, value: &[u8]) -> Result<(), SecretsError> {
        let id = self.secret_id(key)?;
        let name = self.secret_name(key)?;

        if !self.secret_exists(key, &name).await? {
            self.create_secret(key, &id).await?;
        }

        self.add_version(key, &name, value).await?;
        debug!(key = %key, provider = "gcp-secrets", "Secret version added");
        Ok(())
    }

    async fn delete_secret(&self, key: &str) -> Result<(), SecretsError> {
        let name = self.secret_name(key)?;
        let response = self.send(self.http.delete(self.url(&name))).await?;

        if !response.status().is_success() {
            return Err(self.error_for(key, response).await);
        }

        debug!(key = %key, provider = "gcp-secrets", "Secret deleted");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "gcp-secret-manager"
    }

    async fn health_check(&self) -> Result<(), SecretsError> {
        self.tokens.token().await.map(|_| ()).map_err(Into::into)
    }
}
