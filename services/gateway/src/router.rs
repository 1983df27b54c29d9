use crate::handlers::{batch, health, profile, quote};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/quotes", post(batch::batch_quotes))
        .route("/quote/{symbol}", get(quote::get_quote))
        .route("/profile/{symbol}", get(profile::get_profile));

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
