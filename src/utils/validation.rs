use std::path::Path;

/// Content types accepted by `/upload`.
pub const ALLOWED_MIME_TYPES: &[&str] = &["text/csv", "application/json"];

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validates file size against maximum limit
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ValidationError> {
    if size > max_size {
        return Err(ValidationError {
            code: "FILE_TOO_LARGE",
            message: format!(
                "File size {} bytes exceeds maximum allowed {} bytes ({} MB)",
                size,
                max_size,
                max_size / 1024 / 1024
            ),
        });
    }
    Ok(())
}

/// Validates the declared content type against the allowlist. Parameters
/// such as `charset` are ignored; a missing header is rejected.
pub fn validate_mime_type(content_type: Option<&str>) -> Result<(), ValidationError> {
    let declared = content_type.unwrap_or_default();
    let essence = declared
        .parse::<mime::Mime>()
        .map(|m| m.essence_str().to_lowercase())
        .unwrap_or_default();

    if ALLOWED_MIME_TYPES.contains(&essence.as_str()) {
        return Ok(());
    }

    Err(ValidationError {
        code: "INVALID_MIME_TYPE",
        message: format!(
            "Content type '{}' is not allowed. Only CSV and JSON file types are allowed",
            declared
        ),
    })
}

/// Reduces a client supplied file name to its last path component.
pub fn sanitize_filename(filename: &str) -> Result<String, ValidationError> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let name = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    if name.is_empty() {
        return Err(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename cannot be empty".to_string(),
        });
    }

    if name != filename {
        tracing::warn!("Path components stripped from upload name: {}", filename);
    }

    Ok(name.to_string())
}
