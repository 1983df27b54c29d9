use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use types::errors::QuoteError;

/// Central error type for the Gateway application
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Integration unavailable: {0}")]
    IntegrationUnavailable(String),

    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl From<QuoteError> for AppError {
    fn from(err: QuoteError) -> Self {
        match err {
            QuoteError::InvalidArgument(msg) => AppError::InvalidArgument(msg),
            QuoteError::IntegrationUnavailable(msg) => AppError::IntegrationUnavailable(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, code) = match self {
            AppError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, msg, "INVALID_ARGUMENT"),
            AppError::IntegrationUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                msg,
                "INTEGRATION_UNAVAILABLE",
            ),
            AppError::Upstream(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg, "UPSTREAM_ERROR"),
        };

        let body = Json(json!({
            "error": code,
            "message": error_message
        }));

        (status, body).into_response()
    }
}
