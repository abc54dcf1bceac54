pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::processing::ProcessingService;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::files::upload_file,
        api::handlers::files::list_files,
        api::handlers::files::process_file,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::files::UploadResponse,
            api::handlers::files::FileListResponse,
            api::handlers::files::ProcessRequest,
            api::handlers::health::HealthResponse,
            services::processing::PublishedResponse,
        )
    ),
    tags(
        (name = "files", description = "Upload, list and process tabular files"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub processing: Arc<ProcessingService>,
    pub config: AppConfig,
}

// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub fn create_app(state: AppState) -> Router {
    let upload_limit = state.config.max_file_size + MULTIPART_OVERHEAD;

    let routes = Router::new()
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/upload",
            post(api::handlers::files::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/upload/",
            post(api::handlers::files::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/files", get(api::handlers::files::list_files))
        .route("/files/", get(api::handlers::files::list_files))
        .route("/process", post(api::handlers::files::process_file))
        .route("/process/", post(api::handlers::files::process_file));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(routes)
        .layer(from_fn(api::middleware::metrics::metrics_middleware))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .with_state(state)
}
