use crate::api::error::AppError;
use crate::services::aggregator::{self, AggregationResult};
use crate::services::exporter::Exporter;
use crate::services::loader::{self, FileFormat};
use crate::services::publisher::RemotePublisher;
use crate::services::stash::LocalStash;
use crate::utils::validation::{validate_file_size, validate_mime_type};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

pub const PUBLISHED_MESSAGE: &str = "File processed and published successfully";

/// Where and how processed results are published.
#[derive(Clone)]
pub struct Publishing {
    pub publisher: Arc<dyn RemotePublisher>,
    pub container: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PublishedResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Body returned by `/process`: the raw aggregation when nothing is
/// published, the publish summary otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProcessOutcome {
    Aggregated(AggregationResult),
    Published(PublishedResponse),
}

pub struct ProcessingService {
    stash: LocalStash,
    exporter: Exporter,
    publishing: Option<Publishing>,
    max_file_size: usize,
}

impl ProcessingService {
    pub fn new(stash: LocalStash, exporter: Exporter, max_file_size: usize) -> Self {
        Self {
            stash,
            exporter,
            publishing: None,
            max_file_size,
        }
    }

    /// Switches `/process` to publishing mode.
    pub fn with_publishing(mut self, publishing: Publishing) -> Self {
        self.publishing = Some(publishing);
        self
    }

    pub fn stash(&self) -> &LocalStash {
        &self.stash
    }

    pub fn publishing(&self) -> Option<&Publishing> {
        self.publishing.as_ref()
    }

    /// Validates an upload and writes it to the stash. Nothing is written
    /// when validation fails.
    pub async fn store_upload(
        &self,
        filename: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<(), AppError> {
        validate_mime_type(content_type)?;
        validate_file_size(bytes.len(), self.max_file_size)?;

        self.stash.put(filename, bytes).await?;
        tracing::info!(filename, size = bytes.len(), "📥 Stashed upload");
        Ok(())
    }

    pub async fn list_files(&self) -> Result<Vec<String>, AppError> {
        Ok(self.stash.list().await?)
    }

    /// Loads a stashed file, zero-fills it and aggregates sales by category.
    pub async fn aggregate_file(&self, file_name: &str) -> Result<AggregationResult, AppError> {
        let bytes = self.stash.read(file_name).await?;
        let format = FileFormat::from_file_name(file_name)?;
        let table = loader::load(&bytes, format)?;

        tracing::debug!(
            file_name,
            rows = table.row_count(),
            columns = table.columns().len(),
            "Loaded table"
        );

        Ok(aggregator::process(table))
    }

    pub async fn process(&self, file_name: &str) -> Result<ProcessOutcome, AppError> {
        let result = self.aggregate_file(file_name).await?;

        let Some(publishing) = &self.publishing else {
            return Ok(ProcessOutcome::Aggregated(result));
        };

        match result {
            AggregationResult::ColumnsNotFound { message } => {
                tracing::info!(file_name, "Required columns missing, nothing to publish");
                Ok(ProcessOutcome::Published(PublishedResponse { message, url: None }))
            }
            result @ AggregationResult::SalesByCategory { .. } => {
                let url = self.publish(publishing, &result, file_name).await?;
                Ok(ProcessOutcome::Published(PublishedResponse {
                    message: PUBLISHED_MESSAGE.to_string(),
                    url: Some(url),
                }))
            }
        }
    }

    async fn publish(
        &self,
        publishing: &Publishing,
        result: &AggregationResult,
        file_name: &str,
    ) -> Result<String, AppError> {
        let exporter = self.exporter.clone();
        let result = result.clone();
        let source_name = file_name.to_string();
        let exported = tokio::task::spawn_blocking(move || exporter.export(&result, &source_name))
            .await
            .map_err(|e| AppError::Internal(format!("Export task failed: {}", e)))??;

        let outcome = tokio::time::timeout(
            publishing.timeout,
            publishing.publisher.publish(
                &publishing.container,
                exported.path(),
                exported.object_name(),
            ),
        )
        .await;

        // The export only lives for this request, whatever the outcome.
        if let Err(e) = exported.remove() {
            tracing::warn!("Failed to remove exported file: {}", e);
        }

        match outcome {
            Ok(published) => Ok(published?),
            Err(_) => Err(AppError::PublishTimeout(publishing.timeout)),
        }
    }
}
