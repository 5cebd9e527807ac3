//! Recommendation backend abstraction
//!
//! The core never ranks or scores anything itself. It pulls ranked batches, reports
//! decisions, and asks the backend to compute more when supply runs low. The HTTP
//! implementation talks to the recommender service; tests substitute their own.

use crate::{
    error::AppResult,
    models::{
        Batch, ContentId, FilterSelection, GenerationTicket, Rating, RecommendationItem,
        StatusReport, SwipeDecision,
    },
};

pub mod http;

pub use http::HttpBackend;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationBackend: Send + Sync {
    /// Fetch the top `limit` unshown candidates, optionally filtered
    async fn fetch_batch(&self, limit: u32, filters: &FilterSelection) -> AppResult<Batch>;

    /// Record a swipe decision for one item
    async fn record_swipe(&self, content_id: ContentId, decision: SwipeDecision) -> AppResult<()>;

    /// Record a rating for a title the user has already seen
    async fn submit_rating(&self, item: &RecommendationItem, rating: Rating) -> AppResult<()>;

    /// Ask the backend to compute more candidates
    async fn request_generation(&self) -> AppResult<GenerationTicket>;

    /// Status of the latest generation job
    async fn poll_generation_status(&self) -> AppResult<StatusReport>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}
