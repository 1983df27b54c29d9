//! Batch quote aggregator
//!
//! Fans out one guarded lookup per symbol, all concurrently, and races the
//! whole join against a single overall deadline. The envelope always holds
//! exactly one result per de-duplicated symbol, in first-occurrence order.
//!
//! ```text
//!   symbols ──dedup──► guard(AAPL) ─┐
//!                      guard(MSFT) ─┼──► join ──┐
//!                      guard(...)  ─┘           ├──► BatchOutcome
//!                      overall deadline ────────┘
//! ```
//!
//! The two deadlines are independent. With the default 2000ms per item and
//! 3000ms overall, the overall deadline can fire before a slow item's own
//! guard would have; whatever is unresolved at that instant is reported as
//! a timeout.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info_span, warn, Instrument};
use types::errors::QuoteError;
use types::quote::QuoteResult;
use types::symbol::{dedup_symbols, Symbol};
use uuid::Uuid;

use crate::guard::guard;
use crate::metrics::QuoteMetrics;
use crate::upstream::QuoteProvider;

/// Deadlines applied to every batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Maximum time for a single symbol's upstream lookup.
    pub per_item_deadline: Duration,
    /// Maximum time for the whole batch, regardless of per-item progress.
    pub overall_deadline: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            per_item_deadline: Duration::from_millis(2000),
            overall_deadline: Duration::from_millis(3000),
        }
    }
}

/// Result of one aggregation call.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    /// One entry per requested symbol, in request order.
    pub results: Vec<QuoteResult>,
    /// True if the overall deadline cut the batch short.
    pub deadline_exceeded: bool,
}

impl BatchOutcome {
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            deadline_exceeded: false,
        }
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }
}

pub struct QuoteAggregator {
    provider: Arc<dyn QuoteProvider>,
    config: AggregatorConfig,
    metrics: Arc<QuoteMetrics>,
}

impl QuoteAggregator {
    pub fn new(
        provider: Arc<dyn QuoteProvider>,
        config: AggregatorConfig,
        metrics: Arc<QuoteMetrics>,
    ) -> Self {
        Self {
            provider,
            config,
            metrics,
        }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<dyn QuoteProvider> {
        &self.provider
    }

    pub fn metrics(&self) -> &Arc<QuoteMetrics> {
        &self.metrics
    }

    /// Look up every symbol and collect one result each.
    ///
    /// Duplicates are dropped before dispatch. An empty input returns an
    /// empty outcome without touching the provider. Never fails as a whole.
    pub async fn aggregate<I>(&self, symbols: I) -> BatchOutcome
    where
        I: IntoIterator<Item = Symbol>,
    {
        let symbols = dedup_symbols(symbols);
        if symbols.is_empty() {
            return BatchOutcome::empty();
        }

        let span = info_span!("quote_batch", batch_id = %Uuid::now_v7(), symbols = symbols.len());
        self.run(symbols).instrument(span).await
    }

    /// `aggregate` over an untyped symbol collection from the network.
    ///
    /// Input is validated by `parse_symbol_list` before any lookup starts.
    pub async fn aggregate_values(&self, symbols: &Value) -> Result<BatchOutcome, QuoteError> {
        let symbols = parse_symbol_list(symbols)?;
        Ok(self.aggregate(symbols).await)
    }

    /// Look up a single symbol under the per-item deadline only.
    pub async fn quote_one(&self, symbol: Symbol) -> QuoteResult {
        guard(
            self.provider.as_ref(),
            symbol,
            self.config.per_item_deadline,
            &self.metrics,
        )
        .await
    }

    async fn run(&self, symbols: Vec<Symbol>) -> BatchOutcome {
        let started = Instant::now();
        let per_item = self.config.per_item_deadline;
        let provider = self.provider.as_ref();
        let metrics = self.metrics.as_ref();

        let mut pending: FuturesUnordered<_> = symbols
            .iter()
            .cloned()
            .enumerate()
            .map(|(idx, symbol)| async move {
                (idx, guard(provider, symbol, per_item, metrics).await)
            })
            .collect();

        let mut slots: Vec<Option<QuoteResult>> = vec![None; symbols.len()];
        let overall = tokio::time::sleep(self.config.overall_deadline);
        tokio::pin!(overall);

        let mut deadline_exceeded = false;
        loop {
            tokio::select! {
                biased;

                next = pending.next() => match next {
                    Some((idx, result)) => slots[idx] = Some(result),
                    None => break,
                },
                () = &mut overall => {
                    deadline_exceeded = true;
                    break;
                }
            }
        }

        // Abandon whatever is still in flight.
        drop(pending);

        let mut unresolved = 0usize;
        let results: Vec<QuoteResult> = symbols
            .into_iter()
            .zip(slots)
            .map(|(symbol, slot)| {
                slot.unwrap_or_else(|| {
                    unresolved += 1;
                    let result = QuoteResult::timeout(symbol);
                    self.metrics.record_outcome(&result);
                    result
                })
            })
            .collect();

        let elapsed = started.elapsed();
        self.metrics.record_batch(elapsed, deadline_exceeded);

        if deadline_exceeded {
            warn!(
                unresolved,
                resolved = results.len() - unresolved,
                deadline_ms = self.config.overall_deadline.as_millis() as u64,
                "Overall batch deadline exceeded"
            );
        }

        let outcome = BatchOutcome {
            results,
            deadline_exceeded,
        };
        debug!(
            succeeded = outcome.success_count(),
            total = outcome.results.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Batch complete"
        );
        outcome
    }
}

/// Validate an untyped symbol collection from the network boundary.
///
/// Anything other than a non-empty array of non-blank strings is an
/// `InvalidArgument`.
pub fn parse_symbol_list(value: &Value) -> Result<Vec<Symbol>, QuoteError> {
    let items = value
        .as_array()
        .ok_or_else(|| QuoteError::InvalidArgument("symbols must be an array".to_string()))?;

    if items.is_empty() {
        return Err(QuoteError::InvalidArgument(
            "symbols must not be empty".to_string(),
        ));
    }

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            item.as_str()
                .and_then(Symbol::try_new)
                .ok_or_else(|| {
                    QuoteError::InvalidArgument(format!(
                        "symbols[{}] must be a non-empty string",
                        idx
                    ))
                })
        })
        .collect()
}
