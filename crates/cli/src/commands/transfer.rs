use fncache::{ObjectTransport, RemoteConfig};
use fncache_aws::S3Transport;
use miette::IntoDiagnostic;
use std::path::Path;
use tracing::{info, instrument};

/// Download `key` from the configured bucket into `output`
#[instrument(skip(config), fields(bucket = %config.bucket))]
pub async fn get(config: &RemoteConfig, key: &str, output: &Path) -> miette::Result<String> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.into_diagnostic()?;
    }
    let transport = S3Transport::connect(config).await?;
    transport.get_object(&config.bucket, key, output).await?;
    info!(key, output = %output.display(), "Retrieved object");
    Ok(format!("Successfully retrieved file: {}", output.display()))
}

/// Upload `input` to `key` in the configured bucket
#[instrument(skip(config), fields(bucket = %config.bucket))]
pub async fn put(
    config: &RemoteConfig,
    key: &str,
    input: &Path,
    content_type: &str,
) -> miette::Result<String> {
    let transport = S3Transport::connect(config).await?;
    let object = transport
        .put_object(&config.bucket, key, input, content_type)
        .await?;
    info!(key = %object.key, input = %input.display(), "Stored object");
    Ok(format!("Successfully put file: {}", input.display()))
}
