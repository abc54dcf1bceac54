use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::path::Path;
use thiserror::Error;

/// Characters escaped in an object name when building its URL. Keeps the
/// unreserved set and `/` readable.
const OBJECT_NAME_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Failed to read {path}: {source}")]
    ReadLocal {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Upload to {container}/{object_name} failed: {reason}")]
    Upload {
        container: String,
        object_name: String,
        reason: String,
    },
}

/// Pushes local files to a remote object store.
#[async_trait]
pub trait RemotePublisher: Send + Sync {
    /// Uploads `local_file` as `object_name` inside `container` and returns
    /// a publicly resolvable URL for it. Existing objects are overwritten.
    async fn publish(
        &self,
        container: &str,
        local_file: &Path,
        object_name: &str,
    ) -> Result<String, PublishError>;

    /// Whether `container` is reachable.
    async fn health_check(&self, container: &str) -> bool;
}

/// Builds `<base>/<container>/<object>` with the object name escaped.
pub fn public_url(base_url: &str, container: &str, object_name: &str) -> String {
    format!(
        "{}/{}/{}",
        base_url.trim_end_matches('/'),
        utf8_percent_encode(container, OBJECT_NAME_ESCAPES),
        utf8_percent_encode(object_name, OBJECT_NAME_ESCAPES)
    )
}

/// S3 / MinIO backed publisher.
pub struct S3Publisher {
    client: Client,
    public_base_url: String,
}

impl S3Publisher {
    pub fn new(client: Client, public_base_url: String) -> Self {
        Self {
            client,
            public_base_url,
        }
    }
}

#[async_trait]
impl RemotePublisher for S3Publisher {
    async fn publish(
        &self,
        container: &str,
        local_file: &Path,
        object_name: &str,
    ) -> Result<String, PublishError> {
        let data = tokio::fs::read(local_file)
            .await
            .map_err(|source| PublishError::ReadLocal {
                path: local_file.display().to_string(),
                source,
            })?;
        let size = data.len();

        self.client
            .put_object()
            .bucket(container)
            .key(object_name)
            .content_type(mime::TEXT_CSV.as_ref())
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| PublishError::Upload {
                container: container.to_string(),
                object_name: object_name.to_string(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;

        tracing::info!(container, object_name, size, "☁️  Published object");
        Ok(public_url(&self.public_base_url, container, object_name))
    }

    async fn health_check(&self, container: &str) -> bool {
        self.client.head_bucket().bucket(container).send().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url_joins_and_escapes() {
        assert_eq!(
            public_url("http://127.0.0.1:9000/", "results", "sales_sales_by_category.csv"),
            "http://127.0.0.1:9000/results/sales_sales_by_category.csv"
        );
        assert_eq!(
            public_url("https://cdn.example.com", "results", "q1 report/total&more.csv"),
            "https://cdn.example.com/results/q1%20report/total%26more.csv"
        );
    }
}
