use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use types::quote::TIMEOUT_MESSAGE;
use types::symbol::Symbol;

use crate::error::AppError;
use crate::state::AppState;

/// Company profile pass-through, bounded by the per-item deadline.
pub async fn get_profile(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Value>, AppError> {
    let provider = state.integration.provider()?;
    let symbol = Symbol::try_new(symbol)
        .ok_or_else(|| AppError::InvalidArgument("symbol is required".into()))?;

    let deadline = state.aggregator_config.per_item_deadline;
    match tokio::time::timeout(deadline, provider.get_profile(&symbol)).await {
        Ok(Ok(profile)) => Ok(Json(profile)),
        Ok(Err(err)) => {
            if err.is_benign() {
                tracing::debug!(%symbol, error = %err, "Profile not found");
            } else {
                tracing::warn!(%symbol, error = %err, "Profile lookup failed");
            }
            Err(AppError::Upstream(format!("{}: {}", symbol, err)))
        }
        Err(_) => Err(AppError::Upstream(format!("{}: {}", symbol, TIMEOUT_MESSAGE))),
    }
}
