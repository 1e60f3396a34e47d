//! Amazon S3 object transport

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use fncache::{Error, ObjectRef, ObjectTransport, RemoteConfig, RemoteStore, Result};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Provider name attached to the static credentials
const CREDENTIALS_PROVIDER: &str = "fncache";

/// Transfers objects to and from Amazon S3
#[derive(Clone)]
pub struct S3Transport {
    client: Client,
}

impl std::fmt::Debug for S3Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Transport")
            .field("region", &self.client.config().region())
            .finish_non_exhaustive()
    }
}

impl S3Transport {
    /// Create a transport from a remote configuration
    ///
    /// The configuration is validated before any SDK setup happens. When an
    /// endpoint override is present, path-style addressing is used so that
    /// S3-compatible services work without virtual-host DNS.
    ///
    /// # Errors
    /// Returns a configuration error if credentials or bucket are missing.
    pub async fn connect(config: &RemoteConfig) -> Result<Self> {
        config.validate()?;
        let creds = &config.credentials;

        let credentials = Credentials::new(
            creds.access_key_id.clone(),
            creds.secret_access_key().to_string(),
            None,
            None,
            CREDENTIALS_PROVIDER,
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(creds.region.clone()))
            .credentials_provider(credentials);
        if let Some(endpoint) = &creds.endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(creds.endpoint.is_some())
            .build();

        debug!(region = %creds.region, endpoint = ?creds.endpoint, "Created S3 client");
        Ok(Self {
            client: Client::from_conf(s3_config),
        })
    }

    /// Wrap an already configured SDK client
    #[must_use]
    pub const fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn status_code<E>(err: &SdkError<E, HttpResponse>) -> Option<u16> {
    err.raw_response().map(|response| response.status().as_u16())
}

fn transfer_failed<E>(
    operation: &str,
    bucket: &str,
    key: &str,
    err: &SdkError<E, HttpResponse>,
) -> Error
where
    E: std::error::Error + 'static,
{
    Error::transport(format!(
        "S3 {operation} {bucket}/{key} failed: {}",
        DisplayErrorContext(err)
    ))
}

#[async_trait]
impl ObjectTransport for S3Transport {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
        content_type: &str,
    ) -> Result<ObjectRef> {
        let body = ByteStream::from_path(source).await.map_err(|e| {
            Error::transport_with_source(format!("Failed to stream {}", source.display()), e)
        })?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| transfer_failed("PutObject", bucket, key, &e))?;

        info!(bucket, key, "Uploaded object to S3");
        Ok(ObjectRef {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    async fn get_object(&self, bucket: &str, key: &str, destination: &Path) -> Result<()> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let missing = e
                    .as_service_error()
                    .is_some_and(|service| service.is_no_such_key())
                    || status_code(&e) == Some(404);
                if missing {
                    Error::not_found(key)
                } else {
                    transfer_failed("GetObject", bucket, key, &e)
                }
            })?;

        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(|e| Error::io(e, destination, "create"))?;
        let mut body = output.body;
        let mut written = 0usize;
        while let Some(chunk) = body.try_next().await.map_err(|e| {
            Error::transport_with_source(format!("S3 download of {bucket}/{key} interrupted"), e)
        })? {
            file.write_all(&chunk)
                .await
                .map_err(|e| Error::io(e, destination, "write"))?;
            written += chunk.len();
        }
        file.flush()
            .await
            .map_err(|e| Error::io(e, destination, "flush"))?;

        debug!(bucket, key, size = written, "Downloaded object from S3");
        Ok(())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let missing = e
                    .as_service_error()
                    .is_some_and(|service| service.is_not_found())
                    || status_code(&e) == Some(404);
                if missing {
                    Error::not_found(key)
                } else {
                    transfer_failed("HeadObject", bucket, key, &e)
                }
            })?;
        Ok(())
    }
}

/// Build a remote cache store backed by S3
///
/// # Errors
/// Returns a configuration error if credentials or bucket are missing.
pub async fn remote_store(config: RemoteConfig) -> Result<RemoteStore<S3Transport>> {
    let transport = S3Transport::connect(&config).await?;
    RemoteStore::new(config, transport)
}
