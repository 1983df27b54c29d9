use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let integration = if state.integration.is_available() {
        "available"
    } else {
        "unavailable"
    };

    Json(json!({
        "status": "ok",
        "integration": integration,
        "version": market_data::SERVICE_VERSION,
    }))
}

pub async fn metrics(State(state): State<AppState>) -> Json<BTreeMap<String, u64>> {
    Json(state.metrics.export())
}
