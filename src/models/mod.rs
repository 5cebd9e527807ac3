use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::error::{AppError, AppResult};

pub mod filter_selection;
pub mod generation;
pub mod queue_state;

pub use filter_selection::FilterSelection;
pub use generation::{GenerationJob, GenerationStatus, GenerationTicket, JobId, StatusReport};
pub use queue_state::{Epoch, QueueState, QueueStatus};

/// Stable external content identifier (TMDB id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(pub u64);

impl Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A ranked candidate handed to the user for a decision
///
/// Only the fields the core reasons about are typed. Everything else the backend
/// sends (poster, genres, overview, ratings, cast, reasoning...) is kept verbatim in
/// `metadata` and handed back to UI surfaces unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationItem {
    #[serde(rename = "tmdb_id")]
    pub content_id: ContentId,
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// The user's verdict on the item under the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDecision {
    Accept,
    Reject,
    /// The user has already watched it; behaves like `Reject` for the queue
    AlreadySeen,
}

impl SwipeDecision {
    /// Swipe direction understood by the backend
    pub fn wire_action(self) -> &'static str {
        match self {
            SwipeDecision::Accept => "right",
            SwipeDecision::Reject | SwipeDecision::AlreadySeen => "left",
        }
    }

    pub fn is_accept(self) -> bool {
        matches!(self, SwipeDecision::Accept)
    }
}

/// Per-epoch decision counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwipeStats {
    pub liked: u32,
    pub skipped: u32,
}

impl SwipeStats {
    pub fn record(&mut self, decision: SwipeDecision) {
        if decision.is_accept() {
            self.liked += 1;
        } else {
            self.skipped += 1;
        }
    }
}

/// Star rating collected for an already-seen title (0.5 to 5.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Rating(f32);

impl Rating {
    pub const MIN: f32 = 0.5;
    pub const MAX: f32 = 5.0;

    pub fn new(value: f32) -> AppResult<Self> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(AppError::InvalidInput(format!(
                "Rating must be between {} and {}",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

/// One fetched page of ranked candidates
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub items: Vec<RecommendationItem>,
    /// Server-side count of unshown candidates, not derived from `items`
    pub total_unshown: u32,
}

// ============================================================================
// Backend API Types
// ============================================================================

/// Raw response from GET /api/recommendations
#[derive(Debug, Clone, Deserialize)]
pub struct ApiRecommendationsResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub total_unshown: u32,
    #[serde(default)]
    pub recommendations: Vec<RecommendationItem>,
}

impl TryFrom<ApiRecommendationsResponse> for Batch {
    type Error = AppError;

    fn try_from(response: ApiRecommendationsResponse) -> AppResult<Self> {
        if !response.success {
            return Err(AppError::ExternalApi(
                response
                    .error
                    .unwrap_or_else(|| "Recommendation fetch failed".to_string()),
            ));
        }

        Ok(Batch {
            items: response.recommendations,
            total_unshown: response.total_unshown,
        })
    }
}

/// Raw response from POST /api/generate-more
#[derive(Debug, Clone, Deserialize)]
pub struct ApiGenerateResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub generating: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub job_id: Option<JobId>,
    #[serde(default, deserialize_with = "generation::lenient_seconds")]
    pub estimated_seconds: Option<u32>,
}

impl TryFrom<ApiGenerateResponse> for GenerationTicket {
    type Error = AppError;

    fn try_from(response: ApiGenerateResponse) -> AppResult<Self> {
        if !response.success {
            return Err(AppError::ExternalApi(
                response
                    .error
                    .unwrap_or_else(|| "Generation request failed".to_string()),
            ));
        }

        Ok(GenerationTicket {
            generating: response.generating,
            job_id: response.job_id,
            estimated_seconds: response.estimated_seconds,
            message: response.message,
        })
    }
}

/// Generic `{success, error}` envelope for write endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ApiAck {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body for POST /api/swipe
#[derive(Debug, Clone, Serialize)]
pub struct ApiSwipeRequest {
    pub tmdb_id: ContentId,
    pub action: &'static str,
}

/// Body for POST /api/add-rating
#[derive(Debug, Clone, Serialize)]
pub struct ApiRatingRequest {
    pub tmdb_id: ContentId,
    pub title: String,
    pub year: Option<i32>,
    pub rating: Rating,
}

fn default_success() -> bool {
    true
}
