use crate::AppState;
use crate::api::error::AppError;
use crate::services::processing::ProcessOutcome;
use crate::utils::validation::sanitize_filename;
use axum::{
    Json,
    extract::{Multipart, Query, State, multipart::MultipartError},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub filename: String,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct FileListResponse {
    pub files: Vec<String>,
}

#[derive(Deserialize, Default)]
pub struct ProcessQuery {
    pub file_name: Option<String>,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct ProcessRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "file_name must be between 1 and 255 characters"
    ))]
    pub file_name: String,
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(e.body_text())
    }
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = Multipart, description = "CSV or JSON file in the `file` field", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File uploaded successfully", body = UploadResponse),
        (status = 400, description = "Content type is not text/csv or application/json"),
        (status = 413, description = "File too large")
    ),
    tag = "files"
)]
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = sanitize_filename(field.file_name().unwrap_or_default())?;
        let content_type = field.content_type().map(|s| s.to_string());
        let data = field.bytes().await.map_err(multipart_error)?;

        state
            .processing
            .store_upload(&filename, content_type.as_deref(), &data)
            .await?;

        return Ok(Json(UploadResponse {
            filename,
            message: "File uploaded successfully".to_string(),
        }));
    }

    Err(AppError::BadRequest("No file provided".to_string()))
}

#[utoipa::path(
    get,
    path = "/files",
    responses(
        (status = 200, description = "Names of all stashed files", body = FileListResponse)
    ),
    tag = "files"
)]
pub async fn list_files(
    State(state): State<AppState>,
) -> Result<Json<FileListResponse>, AppError> {
    let files = state.processing.list_files().await?;
    Ok(Json(FileListResponse { files }))
}

#[utoipa::path(
    post,
    path = "/process",
    params(
        ("file_name" = Option<String>, Query, description = "Name of a stashed file")
    ),
    request_body(content = ProcessRequest, description = "Alternative to the query parameter"),
    responses(
        (status = 200, description = "Sales grouped by category, or the publish summary when publishing is enabled"),
        (status = 400, description = "Unsupported or malformed file"),
        (status = 404, description = "File not found"),
        (status = 502, description = "Remote store rejected the upload"),
        (status = 503, description = "Remote store timed out")
    ),
    tag = "files"
)]
pub async fn process_file(
    State(state): State<AppState>,
    Query(query): Query<ProcessQuery>,
    body: Option<Json<ProcessRequest>>,
) -> Result<Json<ProcessOutcome>, AppError> {
    let req = match (query.file_name, body) {
        (Some(file_name), _) => ProcessRequest { file_name },
        (None, Some(Json(req))) => req,
        (None, None) => return Err(AppError::BadRequest("file_name is required".to_string())),
    };
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let outcome = state.processing.process(&req.file_name).await?;
    Ok(Json(outcome))
}
