//! Polling client
//!
//! Refreshes the live price cache from a batch source on a fixed-rate
//! schedule. Each cycle takes a sequence number when it starts; the cache
//! only admits a cycle's result for a symbol if no later cycle has written
//! that symbol yet, so a slow cycle can never roll a price back.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use types::symbol::Symbol;

use crate::cache::{LivePrice, LivePriceCache, MergeSummary};
use crate::source::{BatchSource, FetchError};
use crate::watchlist::SymbolSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Time between cycle starts.
    pub interval: Duration,
    /// Budget for one batch fetch, including the network round trip.
    pub cycle_timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            cycle_timeout: Duration::from_secs(5),
        }
    }
}

/// Long-lived polling session bound to one view.
///
/// `start` runs the first cycle immediately and then one per interval.
/// A cycle that overruns the interval delays the next one instead of
/// overlapping it, and missed ticks are not replayed in a burst, so the
/// scheduled loop never has two cycles in flight. `stop` cancels the
/// schedule and voids any cycle that has not merged yet. Dropping the
/// session stops it.
pub struct PollingSession {
    inner: Arc<SessionInner>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

struct SessionInner {
    source: Arc<dyn BatchSource>,
    symbols: Arc<dyn SymbolSource>,
    cache: Arc<LivePriceCache>,
    config: PollerConfig,
    last_sequence: AtomicU64,
    cycles_merged: AtomicU64,
}

impl PollingSession {
    pub fn new(
        source: Arc<dyn BatchSource>,
        symbols: Arc<dyn SymbolSource>,
        cache: Arc<LivePriceCache>,
        config: PollerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                source,
                symbols,
                cache,
                config,
                last_sequence: AtomicU64::new(0),
                cycles_merged: AtomicU64::new(0),
            }),
            cancel: CancellationToken::new(),
            task: Mutex::new(None),
        }
    }

    /// Begin polling. Must be called from within a tokio runtime.
    ///
    /// Returns false if the session is already running or was stopped;
    /// a stopped session cannot be restarted.
    pub fn start(&self) -> bool {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.is_some() || self.cancel.is_cancelled() {
            return false;
        }

        info!(
            interval_ms = self.inner.config.interval.as_millis() as u64,
            "Polling session started"
        );
        let inner = Arc::clone(&self.inner);
        let cancel = self.cancel.clone();
        *task = Some(tokio::spawn(async move { inner.run(cancel).await }));
        true
    }

    /// Stop polling. An in-flight cycle is abandoned and will not merge.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            self.cancel.cancel();
            info!(
                cycles_merged = self.cycles_merged(),
                "Polling session stopped"
            );
        }
    }

    pub fn is_running(&self) -> bool {
        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        task.is_some() && !self.cancel.is_cancelled()
    }

    /// Run one cycle now, outside the schedule.
    ///
    /// Manual cycles may overlap scheduled ones; sequence admission in the
    /// cache keeps the newest value per symbol.
    pub async fn poll_once(&self) -> Option<MergeSummary> {
        self.inner.run_cycle(&self.cancel).await
    }

    pub fn snapshot(&self) -> BTreeMap<Symbol, LivePrice> {
        self.inner.cache.snapshot()
    }

    pub fn cache(&self) -> &Arc<LivePriceCache> {
        &self.inner.cache
    }

    /// Cycles whose results reached the merge step.
    pub fn cycles_merged(&self) -> u64 {
        self.inner.cycles_merged.load(Ordering::SeqCst)
    }
}

impl Drop for PollingSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl SessionInner {
    async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("Polling loop exiting");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_cycle(&cancel).await;
                }
            }
        }
    }

    async fn run_cycle(&self, cancel: &CancellationToken) -> Option<MergeSummary> {
        let sequence = self.last_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let symbols = self.symbols.symbols();
        if symbols.is_empty() {
            debug!(sequence, "Nothing to poll");
            return None;
        }

        let fetched = tokio::select! {
            () = cancel.cancelled() => {
                debug!(sequence, "Cycle abandoned by stop");
                return None;
            }
            res = tokio::time::timeout(self.config.cycle_timeout, self.source.fetch_batch(&symbols)) => {
                res.unwrap_or(Err(FetchError::Timeout(self.config.cycle_timeout)))
            }
        };

        let results = match fetched {
            Ok(results) => results,
            Err(err) => {
                warn!(sequence, error = %err, "Poll cycle failed, keeping cached prices");
                return None;
            }
        };

        // Merge gate: a session stopped while this cycle was in flight
        // must not see its results.
        if cancel.is_cancelled() {
            return None;
        }

        let summary = self.cache.merge_all(sequence, &results);
        self.cycles_merged.fetch_add(1, Ordering::SeqCst);
        debug!(
            sequence,
            applied = summary.applied,
            stale = summary.stale,
            failed = summary.ignored,
            "Poll cycle merged"
        );
        Some(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use types::quote::{Quote, QuoteResult};

    fn sym(s: &str) -> Symbol {
        Symbol::try_new(s).unwrap()
    }

    /// Answers every call with `price = call number`, after `delay`.
    struct CountingSource {
        calls: AtomicUsize,
        delay: Duration,
    }

    #[async_trait]
    impl BatchSource for CountingSource {
        async fn fetch_batch(&self, symbols: &[Symbol]) -> Result<Vec<QuoteResult>, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(self.delay).await;
            Ok(symbols
                .iter()
                .map(|s| {
                    QuoteResult::Success(Quote {
                        symbol: s.clone(),
                        price: call as f64,
                        change: 0.0,
                        change_percent: 0.0,
                    })
                })
                .collect())
        }
    }

    fn counting_session(delay_ms: u64) -> (PollingSession, Arc<CountingSource>) {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            delay: Duration::from_millis(delay_ms),
        });
        let session = PollingSession::new(
            source.clone(),
            Arc::new(vec![sym("AAPL")]),
            Arc::new(LivePriceCache::new()),
            PollerConfig::default(),
        );
        (session, source)
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_polls_immediately_then_on_interval() {
        let (session, source) = counting_session(100);
        assert!(session.start());
        assert!(!session.start(), "second start is a no-op");

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.snapshot()[&sym("AAPL")].price, 1.0);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(session.cycles_merged(), 2);

        session.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_schedule() {
        let (session, source) = counting_session(100);
        session.start();
        tokio::time::sleep(Duration::from_millis(500)).await;

        session.stop();
        assert!(!session.is_running());
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(!session.start(), "stopped sessions stay stopped");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_voids_in_flight_cycle() {
        let (session, source) = counting_session(3000);
        session.start();

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        session.stop();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(session.cache().is_empty());
        assert_eq!(session.cycles_merged(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_source_never_overlaps_cycles() {
        // Each fetch takes 12s against a 10s interval
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            delay: Duration::from_secs(12),
        });
        let session = PollingSession::new(
            source.clone(),
            Arc::new(vec![sym("AAPL")]),
            Arc::new(LivePriceCache::new()),
            PollerConfig {
                interval: Duration::from_secs(10),
                cycle_timeout: Duration::from_secs(15),
            },
        );
        session.start();

        // The overdue tick fires once the running cycle finishes, never
        // alongside it: cycles start at 0s, 12s and 24s
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert_eq!(session.cycles_merged(), 2);

        session.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_timeout_keeps_cache() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            delay: Duration::from_secs(30),
        });
        let session = PollingSession::new(
            source,
            Arc::new(vec![sym("AAPL")]),
            Arc::new(LivePriceCache::new()),
            PollerConfig::default(),
        );

        assert_eq!(session.poll_once().await, None);
        assert!(session.cache().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_symbol_set_skips_fetch() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        });
        let session = PollingSession::new(
            source.clone(),
            Arc::new(Vec::<Symbol>::new()),
            Arc::new(LivePriceCache::new()),
            PollerConfig::default(),
        );

        assert_eq!(session.poll_once().await, None);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }
}
