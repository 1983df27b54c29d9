//! Terminal dashboard: polls a running gateway and prints the demo
//! portfolio with live prices overlaid.
//!
//! `GATEWAY_URL` (default `http://localhost:8080`) and
//! `POLL_INTERVAL_SECS` (default `10`) control the session.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use market_data::cache::LivePriceCache;
use market_data::poller::{PollerConfig, PollingSession};
use market_data::source::HttpBatchSource;
use market_data::watchlist::Watchlist;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let gateway_url =
        std::env::var("GATEWAY_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
    let interval_secs: u64 = match std::env::var("POLL_INTERVAL_SECS") {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid POLL_INTERVAL_SECS: {:?}", raw))?,
        Err(_) => 10,
    };

    let config = PollerConfig {
        interval: Duration::from_secs(interval_secs.max(1)),
        ..PollerConfig::default()
    };
    let source = HttpBatchSource::new(&gateway_url, config.cycle_timeout)
        .context("failed to build batch client")?;
    tracing::info!(url = source.url(), "Polling gateway");

    let watchlist = Arc::new(Watchlist::demo());
    let session = PollingSession::new(
        Arc::new(source),
        watchlist.clone(),
        Arc::new(LivePriceCache::new()),
        config,
    );
    session.start();

    render_until(tokio::signal::ctrl_c(), config.interval, || {
        let live = session.snapshot();
        for row in watchlist.rows(&live) {
            tracing::info!(
                symbol = %row.symbol,
                price = row.price,
                change = row.change,
                change_percent = row.change_percent,
                market_value = row.market_value,
                live = row.is_live,
                "quote"
            );
        }
        tracing::info!(
            portfolio_value = watchlist.portfolio_value(&live),
            "portfolio"
        );
    })
    .await;

    session.stop();
    Ok(())
}

/// Draw a frame on every tick until `shutdown` resolves. Returns the number
/// of frames drawn. `shutdown` is polled across ticks, never recreated.
async fn render_until<F>(shutdown: F, every: Duration, mut frame: impl FnMut()) -> usize
where
    F: Future,
{
    tokio::pin!(shutdown);
    let mut ticks = tokio::time::interval(every);
    let mut frames = 0;
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticks.tick() => {
                frame();
                frames += 1;
            }
        }
    }
    frames
}
