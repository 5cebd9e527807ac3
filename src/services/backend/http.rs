/// HTTP client for the recommender service
///
/// Endpoints:
/// 1. Batch: GET /api/recommendations?limit=N&genres=A,B
/// 2. Swipe: POST /api/swipe
/// 3. Rating: POST /api/add-rating
/// 4. Generation: POST /api/generate-more, then GET /api/generation-status
use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{
        ApiAck, ApiGenerateResponse, ApiRatingRequest, ApiRecommendationsResponse,
        ApiSwipeRequest, Batch, ContentId, FilterSelection, GenerationTicket, Rating,
        RecommendationItem, StatusReport, SwipeDecision,
    },
    services::backend::RecommendationBackend,
};
use reqwest::{Client as HttpClient, Response};
use serde::de::DeserializeOwned;

#[derive(Clone)]
pub struct HttpBackend {
    http_client: HttpClient,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &Config) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self::with_client(http_client, &config.backend_url))
    }

    pub fn with_client(http_client: HttpClient, base_url: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Query parameters for a batch fetch
    fn batch_query(limit: u32, filters: &FilterSelection) -> Vec<(&'static str, String)> {
        let mut query = vec![("limit", limit.to_string())];
        if let Some(genres) = filters.to_query_value() {
            query.push(("genres", genres));
        }
        query
    }

    /// Decodes a JSON body, turning non-2xx responses into backend errors
    async fn decode<T: DeserializeOwned>(response: Response) -> AppResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Backend request failed");
            return Err(AppError::ExternalApi(format!(
                "Backend returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }

    /// Separates requests that never reached the backend from ones that may have
    fn send_error(error: reqwest::Error) -> AppError {
        if error.is_connect() {
            AppError::BackendUnreachable(error.to_string())
        } else {
            AppError::HttpClient(error)
        }
    }

    fn check_ack(ack: ApiAck, what: &str) -> AppResult<()> {
        if ack.success {
            Ok(())
        } else {
            Err(AppError::ExternalApi(
                ack.error.unwrap_or_else(|| format!("{} rejected", what)),
            ))
        }
    }
}

#[async_trait::async_trait]
impl RecommendationBackend for HttpBackend {
    async fn fetch_batch(&self, limit: u32, filters: &FilterSelection) -> AppResult<Batch> {
        let response = self
            .http_client
            .get(self.url("/api/recommendations"))
            .query(&Self::batch_query(limit, filters))
            .send()
            .await
            .map_err(Self::send_error)?;

        let body: ApiRecommendationsResponse = Self::decode(response).await?;
        let batch = Batch::try_from(body)?;

        tracing::info!(
            items = batch.items.len(),
            total_unshown = batch.total_unshown,
            filters = ?filters.to_query_value(),
            "Batch fetched"
        );

        Ok(batch)
    }

    async fn record_swipe(&self, content_id: ContentId, decision: SwipeDecision) -> AppResult<()> {
        let response = self
            .http_client
            .post(self.url("/api/swipe"))
            .json(&ApiSwipeRequest {
                tmdb_id: content_id,
                action: decision.wire_action(),
            })
            .send()
            .await
            .map_err(Self::send_error)?;

        let ack: ApiAck = Self::decode(response).await?;
        Self::check_ack(ack, "Swipe")
    }

    async fn submit_rating(&self, item: &RecommendationItem, rating: Rating) -> AppResult<()> {
        let response = self
            .http_client
            .post(self.url("/api/add-rating"))
            .json(&ApiRatingRequest {
                tmdb_id: item.content_id,
                title: item.title.clone(),
                year: item.year,
                rating,
            })
            .send()
            .await
            .map_err(Self::send_error)?;

        let ack: ApiAck = Self::decode(response).await?;
        Self::check_ack(ack, "Rating")
    }

    async fn request_generation(&self) -> AppResult<GenerationTicket> {
        let response = self
            .http_client
            .post(self.url("/api/generate-more"))
            .send()
            .await
            .map_err(Self::send_error)?;

        let body: ApiGenerateResponse = Self::decode(response).await?;
        let ticket = GenerationTicket::try_from(body)?;

        tracing::info!(
            generating = ticket.generating,
            job_id = ?ticket.job_id,
            estimated_seconds = ?ticket.estimated_seconds,
            message = ?ticket.message,
            "Generation requested"
        );

        Ok(ticket)
    }

    async fn poll_generation_status(&self) -> AppResult<StatusReport> {
        let response = self
            .http_client
            .get(self.url("/api/generation-status"))
            .send()
            .await
            .map_err(Self::send_error)?;

        let report: StatusReport = Self::decode(response).await?;
        tracing::debug!(
            status = ?report.status,
            progress = ?report.progress,
            stage = ?report.stage,
            "Generation status polled"
        );

        Ok(report)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
