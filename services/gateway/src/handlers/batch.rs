use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use types::wire::BatchResponse;

use crate::error::AppError;
use crate::state::AppState;

/// `POST /api/quotes` with `{"symbols": [...]}`.
///
/// Per-symbol failures stay inside a 200 envelope. A 504 still carries the
/// envelope, with every symbol unresolved at the overall deadline reported
/// as a timeout.
pub async fn batch_quotes(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    // 1. Integration must be configured
    let aggregator = state.aggregator()?;

    // 2. Validate input
    let Json(body) = payload.map_err(|e| AppError::InvalidArgument(e.body_text()))?;
    let symbols = body
        .get("symbols")
        .ok_or_else(|| AppError::InvalidArgument("symbols is required".into()))?;

    // 3. Fan out
    let outcome = aggregator.aggregate_values(symbols).await?;

    let status = if outcome.deadline_exceeded {
        StatusCode::GATEWAY_TIMEOUT
    } else {
        StatusCode::OK
    };

    Ok((status, Json(BatchResponse::from_results(&outcome.results))).into_response())
}
