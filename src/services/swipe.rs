use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::{
    error::{AppError, AppResult},
    models::{QueueState, Rating, RecommendationItem, SwipeDecision},
    services::backend::RecommendationBackend,
};

/// Applies decisions to the queue and reports them to the backend
///
/// Local state always moves first. The backend write runs in the background and a
/// failure there is only logged: the cursor and counters are never rolled back, and
/// nothing retries. Server and client can therefore disagree on recorded swipes.
#[derive(Clone)]
pub struct SwipeProcessor {
    backend: Arc<dyn RecommendationBackend>,
}

impl SwipeProcessor {
    pub fn new(backend: Arc<dyn RecommendationBackend>) -> Self {
        Self { backend }
    }

    /// Consumes the item under the cursor
    pub fn apply(queue: &mut QueueState, decision: SwipeDecision) -> AppResult<RecommendationItem> {
        queue.advance(decision).ok_or(AppError::QueueExhausted)
    }

    /// Fire-and-forget write of a decision (and optional rating)
    pub fn dispatch(
        &self,
        item: RecommendationItem,
        decision: SwipeDecision,
        rating: Option<Rating>,
    ) -> JoinHandle<()> {
        let backend = self.backend.clone();

        tokio::spawn(async move {
            if let Err(e) = backend.record_swipe(item.content_id, decision).await {
                tracing::warn!(
                    error = %e,
                    content_id = %item.content_id,
                    decision = ?decision,
                    backend = backend.name(),
                    "Failed to record swipe"
                );
            }

            if let Some(rating) = rating {
                if let Err(e) = backend.submit_rating(&item, rating).await {
                    tracing::warn!(
                        error = %e,
                        content_id = %item.content_id,
                        rating = rating.value(),
                        "Failed to record rating"
                    );
                }
            }
        })
    }
}
