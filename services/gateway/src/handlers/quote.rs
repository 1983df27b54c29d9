use axum::{
    extract::{Path, State},
    Json,
};
use types::quote::QuoteResult;
use types::symbol::Symbol;
use types::wire::QuoteData;

use crate::error::AppError;
use crate::state::AppState;

pub async fn get_quote(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<QuoteData>, AppError> {
    let aggregator = state.aggregator()?;
    let symbol = Symbol::try_new(symbol)
        .ok_or_else(|| AppError::InvalidArgument("symbol is required".into()))?;

    match aggregator.quote_one(symbol).await {
        QuoteResult::Success(quote) => Ok(Json(QuoteData::from(&quote))),
        QuoteResult::Failure { symbol, reason } => {
            Err(AppError::Upstream(format!("{}: {}", symbol, reason)))
        }
    }
}
