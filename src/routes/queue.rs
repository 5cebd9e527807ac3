use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{FilterSelection, RecommendationItem, SwipeDecision},
    routes::AppState,
    services::{ConsumeOutcome, QueueSnapshot},
};

#[derive(Debug, Deserialize)]
pub struct ConsumeRequest {
    pub decision: SwipeDecision,
    /// Only meaningful with `already_seen`
    #[serde(default)]
    pub rating: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct FiltersRequest {
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SurfaceRequest {
    pub active: bool,
}

pub async fn snapshot(State(state): State<Arc<AppState>>) -> Json<QueueSnapshot> {
    Json(state.discovery.snapshot().await)
}

pub async fn current(State(state): State<Arc<AppState>>) -> Json<Option<RecommendationItem>> {
    Json(state.discovery.current_item().await)
}

/// Handler for swipe decisions
pub async fn consume(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<ConsumeRequest>,
) -> AppResult<Json<ConsumeOutcome>> {
    let outcome = state
        .discovery
        .consume(request.decision, request.rating)
        .await?;

    tracing::debug!(
        request_id = %request_id,
        content_id = %outcome.item.content_id,
        remaining = outcome.queue.remaining,
        "Decision recorded"
    );

    Ok(Json(outcome))
}

pub async fn reload(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<QueueSnapshot>> {
    tracing::info!(request_id = %request_id, "Reload requested");
    Ok(Json(state.discovery.reload().await?))
}

pub async fn change_filters(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<FiltersRequest>,
) -> AppResult<Json<QueueSnapshot>> {
    let selection = FilterSelection::from_genres(&request.genres);
    tracing::info!(
        request_id = %request_id,
        genres = ?selection.to_query_value(),
        "Filter change requested"
    );

    Ok(Json(state.discovery.change_filters(selection).await?))
}

pub async fn set_surface(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SurfaceRequest>,
) -> StatusCode {
    state.discovery.set_surface_active(request.active).await;
    StatusCode::NO_CONTENT
}
