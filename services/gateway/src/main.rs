mod config;
mod error;
mod handlers;
mod router;
mod state;

use config::GatewayConfig;
use router::create_router;
use state::AppState;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Local overrides; absence of a .env file is fine
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = GatewayConfig::from_env()?;
    tracing::info!(?config, "Starting quote gateway");

    // The upstream client is built exactly once and shared by every request
    let state = AppState::from_config(&config);
    if !state.integration.is_available() {
        tracing::warn!(
            integration = ?state.integration,
            "Upstream integration unavailable, quote endpoints will answer 503"
        );
    }

    let app = create_router(state);

    let listener = TcpListener::bind(config.addr).await?;
    tracing::info!("Listening on {}", config.addr);
    axum::serve(listener, app).await?;

    Ok(())
}
