use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// The request never left this machine (connection refused, DNS failure)
    #[error("Backend unreachable: {0}")]
    BackendUnreachable(String),

    #[error("Backend error: {0}")]
    ExternalApi(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No recommendation batch has been loaded")]
    QueueNotLoaded,

    #[error("Recommendation batch is exhausted")]
    QueueExhausted,

    #[error("A generation job is already being tracked")]
    GenerationInProgress,

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// True for errors caused by calling an operation in the wrong queue state
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            AppError::QueueNotLoaded | AppError::QueueExhausted | AppError::GenerationInProgress
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            e if e.is_precondition() => StatusCode::CONFLICT,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::HttpClient(_)
            | AppError::BackendUnreachable(_)
            | AppError::ExternalApi(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
