use axum::{
    extract::State,
    response::{sse::Event, Sse},
};
use futures::stream::Stream;
use std::{convert::Infallible, sync::Arc};

use crate::routes::AppState;

/// SSE stream for notification surfaces
pub async fn stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::info!(
        subscribers = state.notifier.subscriber_count() + 1,
        "Notification surface connected"
    );
    state.notifier.sse()
}
