use axum::{
    http::StatusCode,
    middleware::from_fn,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::{BroadcastNotifier, Discovery},
};

pub mod generation;
pub mod notifications;
pub mod queue;

/// Shared state for the local API
pub struct AppState {
    pub discovery: Discovery,
    pub notifier: BroadcastNotifier,
}

impl AppState {
    pub fn new(discovery: Discovery, notifier: BroadcastNotifier) -> Arc<Self> {
        Arc::new(Self {
            discovery,
            notifier,
        })
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/queue", get(queue::snapshot))
        .route("/queue/current", get(queue::current))
        .route("/queue/consume", post(queue::consume))
        .route("/queue/reload", post(queue::reload))
        .route("/queue/filters", put(queue::change_filters))
        .route("/surface", put(queue::set_surface))
        .route("/generation", get(generation::status))
        .route("/generation/retry", post(generation::retry))
        .route("/notifications", get(notifications::stream))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
