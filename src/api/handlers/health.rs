use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub stash: String,
    pub publisher: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "System health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let stash_status = if state.processing.stash().list().await.is_ok() {
        "available"
    } else {
        "unavailable"
    };

    let publisher_status = match state.processing.publishing() {
        None => "disabled",
        Some(p) if p.publisher.health_check(&p.container).await => "connected",
        Some(_) => "disconnected",
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        stash: stash_status.to_string(),
        publisher: publisher_status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
