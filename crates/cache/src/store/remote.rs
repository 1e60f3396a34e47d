//! Remote object store backed by a pluggable transport
//!
//! Transfers are staged through temporary local files: the object is
//! downloaded into a staging file and read back, or the bytes are written to
//! a staging file and uploaded from there. Staging files are removed when
//! they go out of scope, on success and on failure alike.

use super::Store;
use crate::{Error, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// Content type used for uploads unless overridden
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Credentials for the remote object store
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCredentials {
    /// Access key id
    #[serde(default)]
    pub access_key_id: String,

    /// Secret access key, redacted in debug output
    #[serde(default = "empty_secret", deserialize_with = "deserialize_secret")]
    pub secret_access_key: SecretString,

    /// Region of the bucket
    #[serde(default)]
    pub region: String,

    /// Endpoint override for S3-compatible stores
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl RemoteCredentials {
    /// Create credentials for the default endpoint
    #[must_use]
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: SecretString::from(secret_access_key.into()),
            region: region.into(),
            endpoint: None,
        }
    }

    /// Use a custom endpoint
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// The secret access key
    #[must_use]
    pub fn secret_access_key(&self) -> &str {
        self.secret_access_key.expose_secret()
    }
}

fn empty_secret() -> SecretString {
    SecretString::from(String::new())
}

fn deserialize_secret<'de, D>(deserializer: D) -> std::result::Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

/// Configuration of the remote store: credentials plus the target bucket
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfig {
    /// Credentials used for every transfer
    #[serde(flatten)]
    pub credentials: RemoteCredentials,

    /// Bucket holding the cache entries
    #[serde(default)]
    pub bucket: String,
}

impl RemoteConfig {
    /// Create a remote configuration
    #[must_use]
    pub fn new(credentials: RemoteCredentials, bucket: impl Into<String>) -> Self {
        Self {
            credentials,
            bucket: bucket.into(),
        }
    }

    /// Read credentials from the standard AWS environment variables
    ///
    /// Uses `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `AWS_REGION`
    /// (falling back to `AWS_DEFAULT_REGION`) and `AWS_ENDPOINT_URL`.
    pub fn from_env(bucket: impl Into<String>) -> Result<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        let credentials = RemoteCredentials {
            access_key_id: var("AWS_ACCESS_KEY_ID").unwrap_or_default(),
            secret_access_key: SecretString::from(
                var("AWS_SECRET_ACCESS_KEY").unwrap_or_default(),
            ),
            region: var("AWS_REGION")
                .or_else(|| var("AWS_DEFAULT_REGION"))
                .unwrap_or_default(),
            endpoint: var("AWS_ENDPOINT_URL"),
        };
        let config = Self::new(credentials, bucket);
        config.validate()?;
        Ok(config)
    }

    /// Check that every credential field and the bucket are present
    pub fn validate(&self) -> Result<()> {
        let creds = &self.credentials;
        if creds.access_key_id.trim().is_empty()
            || creds.secret_access_key().trim().is_empty()
            || creds.region.trim().is_empty()
        {
            return Err(Error::configuration(
                "remote credentials require accessKeyId, secretAccessKey and region",
            ));
        }
        if self.bucket.trim().is_empty() {
            return Err(Error::configuration(
                "a bucket is required to use the remote cache",
            ));
        }
        Ok(())
    }
}

/// Reference to an uploaded object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Bucket the object was written to
    pub bucket: String,
    /// Key of the object
    pub key: String,
}

/// Transfer capability of an object store
///
/// Implementations report a missing object as [`Error::NotFound`] and every
/// other failure as [`Error::Transport`].
#[async_trait]
pub trait ObjectTransport: Send + Sync {
    /// Upload the file at `source` to `bucket/key`
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
        content_type: &str,
    ) -> Result<ObjectRef>;

    /// Download `bucket/key` into the file at `destination`
    async fn get_object(&self, bucket: &str, key: &str, destination: &Path) -> Result<()>;

    /// Check that `bucket/key` exists without downloading it
    async fn head_object(&self, bucket: &str, key: &str) -> Result<()>;
}

#[async_trait]
impl<T: ObjectTransport + ?Sized> ObjectTransport for std::sync::Arc<T> {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
        content_type: &str,
    ) -> Result<ObjectRef> {
        (**self).put_object(bucket, key, source, content_type).await
    }

    async fn get_object(&self, bucket: &str, key: &str, destination: &Path) -> Result<()> {
        (**self).get_object(bucket, key, destination).await
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<()> {
        (**self).head_object(bucket, key).await
    }
}

/// Remote cache store
#[derive(Debug)]
pub struct RemoteStore<T> {
    config: RemoteConfig,
    transport: T,
    content_type: String,
}

impl<T: ObjectTransport> RemoteStore<T> {
    /// Create a remote store, validating the configuration first
    pub fn new(config: RemoteConfig, transport: T) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transport,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
        })
    }

    /// Override the content type used for uploads
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// The validated configuration
    #[must_use]
    pub const fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// The underlying transport
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    fn bucket(&self) -> &str {
        &self.config.bucket
    }

    async fn download(&self, location: &str, staging: &Path) -> Result<Option<Vec<u8>>> {
        match self
            .transport
            .get_object(self.bucket(), location, staging)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                warn!(bucket = %self.bucket(), key = location, "Remote object not found");
                return Ok(None);
            }
            Err(e) => return Err(e),
        }
        let bytes = tokio::fs::read(staging)
            .await
            .map_err(|e| Error::io(e, staging, "read staging file"))?;
        Ok(Some(bytes))
    }

    async fn upload(&self, location: &str, staging: &Path, bytes: &[u8]) -> Result<ObjectRef> {
        tokio::fs::write(staging, bytes)
            .await
            .map_err(|e| Error::io(e, staging, "write staging file"))?;
        self.transport
            .put_object(self.bucket(), location, staging, &self.content_type)
            .await
    }
}

/// Create a staging file off the async runtime
async fn staging_file() -> Result<NamedTempFile> {
    tokio::task::spawn_blocking(NamedTempFile::new)
        .await
        .map_err(|e| Error::io_no_path(std::io::Error::other(e), "create staging file"))?
        .map_err(|e| Error::io_no_path(e, "create staging file"))
}

/// Remove a staging file off the async runtime
///
/// Dropping the file also removes it, which covers cancelled transfers.
async fn release(staging: NamedTempFile) {
    let path = staging.path().to_path_buf();
    let removed = tokio::task::spawn_blocking(move || staging.close()).await;
    if !matches!(removed, Ok(Ok(()))) {
        warn!(path = %path.display(), "Failed to remove staging file");
    }
}

#[async_trait]
impl<T: ObjectTransport> Store for RemoteStore<T> {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn exists(&self, location: &str) -> Result<bool> {
        match self.transport.head_object(self.bucket(), location).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn read(&self, location: &str) -> Result<Option<Vec<u8>>> {
        let staging = staging_file().await?;
        let result = self.download(location, staging.path()).await;
        release(staging).await;
        result
    }

    async fn write(&self, location: &str, bytes: &[u8]) -> Result<()> {
        let staging = staging_file().await?;
        let result = self.upload(location, staging.path(), bytes).await;
        release(staging).await;
        let object = result?;
        info!(
            bucket = %object.bucket,
            key = %object.key,
            size = bytes.len(),
            "Uploaded remote cache entry"
        );
        Ok(())
    }
}
