use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    error::AppResult, middleware::request_id::RequestId, models::GenerationJob, routes::AppState,
    services::QueueSnapshot,
};

pub async fn status(State(state): State<Arc<AppState>>) -> Json<GenerationJob> {
    Json(state.discovery.generation().await)
}

/// Handler for the manual retry after a failed generation job
pub async fn retry(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<QueueSnapshot>> {
    tracing::info!(request_id = %request_id, "Generation retry requested");
    Ok(Json(state.discovery.retry_generation().await?))
}
