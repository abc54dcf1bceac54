use crate::config::AppConfig;
use crate::services::publisher::S3Publisher;
use anyhow::{Context, Result};
use aws_sdk_s3::config::Region;
use std::sync::Arc;
use tracing::{info, warn};

/// Builds the S3 / MinIO publisher from config. Only called when
/// publishing is enabled, so missing connection settings are an error.
pub async fn setup_publisher(config: &AppConfig) -> Result<Arc<S3Publisher>> {
    let endpoint_url = config
        .s3_endpoint
        .clone()
        .context("MINIO_ENDPOINT must be set when PUBLISH_ENABLED is on")?;
    let access_key = config
        .s3_access_key
        .clone()
        .context("MINIO_ACCESS_KEY must be set when PUBLISH_ENABLED is on")?;
    let secret_key = config
        .s3_secret_key
        .clone()
        .context("MINIO_SECRET_KEY must be set when PUBLISH_ENABLED is on")?;
    let bucket = &config.publish_bucket;

    info!("☁️  S3 Storage: {} (Bucket: {})", endpoint_url, bucket);

    let aws_config = aws_config::from_env()
        .endpoint_url(&endpoint_url)
        .region(Region::new(config.s3_region.clone()))
        .credentials_provider(aws_sdk_s3::config::Credentials::new(
            access_key, secret_key, None, None, "static",
        ))
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(true)
        .build();

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);

    // Publishing reports a missing bucket per request; here we only warn.
    match s3_client.head_bucket().bucket(bucket).send().await {
        Ok(_) => info!("✅ Bucket '{}' is ready", bucket),
        Err(e) => warn!(
            "🪣 Bucket '{}' is not reachable, publishing will fail until it exists: {}",
            bucket,
            aws_sdk_s3::error::DisplayErrorContext(&e)
        ),
    }

    let public_base_url = config
        .public_base_url
        .clone()
        .unwrap_or(endpoint_url);

    Ok(Arc::new(S3Publisher::new(s3_client, public_base_url)))
}
