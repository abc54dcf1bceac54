use crate::services::aggregator::{AggregationResult, CATEGORY_COLUMN, SALES_COLUMN};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Nothing to export: {0}")]
    InvalidInput(String),

    #[error("Export I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A `category,sales` CSV on local disk. The file is removed when this value
/// is dropped.
#[derive(Debug)]
pub struct ExportedFile {
    file: NamedTempFile,
    object_name: String,
}

impl ExportedFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Name the file should carry once published.
    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    /// Deletes the file now, reporting any failure instead of ignoring it.
    pub fn remove(self) -> std::io::Result<()> {
        self.file.close()
    }
}

#[derive(Debug, Clone)]
pub struct Exporter {
    dir: PathBuf,
}

impl Exporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Writes the grouped totals of `result` in aggregation order.
    /// `source_name` is the stashed file the result came from. Blocking; call
    /// it off the async runtime.
    pub fn export(
        &self,
        result: &AggregationResult,
        source_name: &str,
    ) -> Result<ExportedFile, ExportError> {
        let records = match result {
            AggregationResult::SalesByCategory { sales_by_category } => sales_by_category,
            AggregationResult::ColumnsNotFound { message } => {
                return Err(ExportError::InvalidInput(message.clone()));
            }
        };

        std::fs::create_dir_all(&self.dir)?;
        let mut file = tempfile::Builder::new()
            .prefix("sales_by_category_")
            .suffix(".csv")
            .tempfile_in(&self.dir)?;

        {
            let mut writer = csv::Writer::from_writer(&mut file);
            writer.write_record([CATEGORY_COLUMN, SALES_COLUMN])?;
            for record in records {
                writer.write_record([record.category.to_string(), record.sales.to_string()])?;
            }
            writer.flush()?;
        }

        tracing::debug!(
            path = %file.path().display(),
            rows = records.len(),
            "exported aggregation"
        );

        Ok(ExportedFile {
            file,
            object_name: object_name_for(source_name),
        })
    }
}

/// `sales.csv` becomes `sales_sales_by_category.csv`.
pub fn object_name_for(source_name: &str) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("export");
    format!("{stem}_sales_by_category.csv")
}
