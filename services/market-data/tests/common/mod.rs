//! Shared fixtures for the market-data integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use market_data::aggregator::{AggregatorConfig, QuoteAggregator};
use market_data::metrics::QuoteMetrics;
use market_data::upstream::QuoteProvider;
use serde_json::{json, Value};
use tracing_subscriber::fmt::MakeWriter;
use types::errors::UpstreamError;
use types::symbol::Symbol;

/// Provider whose answer and latency are scripted per symbol.
///
/// Unscripted symbols answer `NotFound` immediately.
#[derive(Default)]
pub struct ScriptedProvider {
    script: HashMap<String, (Duration, Result<Value, UpstreamError>)>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quote(mut self, symbol: &str, after_ms: u64, c: f64, d: f64, dp: f64) -> Self {
        self.script.insert(
            symbol.to_string(),
            (Duration::from_millis(after_ms), Ok(json!({"c": c, "d": d, "dp": dp}))),
        );
        self
    }

    pub fn payload(mut self, symbol: &str, after_ms: u64, payload: Value) -> Self {
        self.script
            .insert(symbol.to_string(), (Duration::from_millis(after_ms), Ok(payload)));
        self
    }

    pub fn error(mut self, symbol: &str, after_ms: u64, err: UpstreamError) -> Self {
        self.script
            .insert(symbol.to_string(), (Duration::from_millis(after_ms), Err(err)));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteProvider for ScriptedProvider {
    async fn get_quote(&self, symbol: &Symbol) -> Result<Value, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.get(symbol.as_str()) {
            Some((delay, response)) => {
                tokio::time::sleep(*delay).await;
                response.clone()
            }
            None => Err(UpstreamError::NotFound),
        }
    }

    async fn get_profile(&self, symbol: &Symbol) -> Result<Value, UpstreamError> {
        Ok(json!({"ticker": symbol.as_str()}))
    }
}

pub fn sym(s: &str) -> Symbol {
    Symbol::try_new(s).unwrap()
}

pub fn syms(list: &[&str]) -> Vec<Symbol> {
    list.iter().map(|s| sym(s)).collect()
}

pub fn aggregator(
    provider: Arc<ScriptedProvider>,
    per_item_ms: u64,
    overall_ms: u64,
) -> QuoteAggregator {
    QuoteAggregator::new(
        provider,
        AggregatorConfig {
            per_item_deadline: Duration::from_millis(per_item_ms),
            overall_deadline: Duration::from_millis(overall_ms),
        },
        Arc::new(QuoteMetrics::new()),
    )
}

/// In-memory log sink for asserting on emitted events.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    /// Install a TRACE-level plain-text subscriber for the current thread.
    pub fn capture(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .without_time()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
