//! Per-symbol timeout guard
//!
//! Races one upstream lookup against its own deadline. A lookup that loses
//! the race is abandoned: its future is dropped, nothing awaits it and no
//! retry is issued.

use std::time::Duration;

use tracing::{debug, warn};
use types::quote::{FailureReason, QuoteResult};
use types::symbol::Symbol;

use crate::metrics::QuoteMetrics;
use crate::normalizer::normalize;
use crate::upstream::QuoteProvider;

/// Look up one symbol, bounded by `deadline`.
///
/// Never fails: upstream errors, invalid payloads and deadline expiry all
/// come back as `QuoteResult::Failure`. Not-found and invalid-symbol errors
/// are expected for user-supplied tickers and are only logged at debug.
pub async fn guard(
    provider: &dyn QuoteProvider,
    symbol: Symbol,
    deadline: Duration,
    metrics: &QuoteMetrics,
) -> QuoteResult {
    metrics.record_request();

    let result = match tokio::time::timeout(deadline, provider.get_quote(&symbol)).await {
        Ok(Ok(payload)) => {
            let result = normalize(&symbol, &payload);
            if !result.is_success() {
                debug!(%symbol, payload = %payload, "Upstream payload rejected");
            }
            result
        }
        Ok(Err(err)) => {
            if err.is_benign() {
                metrics.record_benign_error();
                debug!(%symbol, error = %err, "Upstream lookup found nothing");
            } else {
                warn!(%symbol, error = %err, "Upstream lookup failed");
            }
            QuoteResult::failure(symbol, FailureReason::Upstream(err.to_string()))
        }
        Err(_) => {
            warn!(
                %symbol,
                deadline_ms = deadline.as_millis() as u64,
                "Upstream lookup timed out"
            );
            QuoteResult::timeout(symbol)
        }
    };

    metrics.record_outcome(&result);
    result
}
