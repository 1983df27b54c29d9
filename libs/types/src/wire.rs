//! JSON wire contract of the batch and single-quote endpoints
//!
//! Field names `c`, `d` and `dp` are the external contract shared with
//! polling clients and must not be renamed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::quote::{FailureReason, Quote, QuoteResult};
use crate::symbol::Symbol;

/// Price fields of a successful entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuoteData {
    /// Current price
    pub c: f64,
    /// Absolute change
    pub d: f64,
    /// Percent change
    pub dp: f64,
}

impl QuoteData {
    /// Read price fields out of an untyped payload.
    ///
    /// `c` must be a finite number or there is no usable quote. Missing,
    /// null or non-numeric `d`/`dp` read as zero.
    pub fn from_value(payload: &Value) -> Option<Self> {
        Some(Self {
            c: finite_field(payload, "c")?,
            d: finite_field(payload, "d").unwrap_or(0.0),
            dp: finite_field(payload, "dp").unwrap_or(0.0),
        })
    }

    pub fn into_quote(self, symbol: Symbol) -> Quote {
        Quote {
            symbol,
            price: self.c,
            change: self.d,
            change_percent: self.dp,
        }
    }
}

fn finite_field(payload: &Value, key: &str) -> Option<f64> {
    payload
        .get(key)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
}

impl From<&Quote> for QuoteData {
    fn from(quote: &Quote) -> Self {
        Self {
            c: quote.price,
            d: quote.change,
            dp: quote.change_percent,
        }
    }
}

/// One symbol's entry in a batch response: `{symbol, data?, error?}`
///
/// Decoding is per entry: a `data` object without a usable `c` leaves
/// `data` empty instead of failing the surrounding envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawQuoteEntry")]
pub struct QuoteEntry {
    pub symbol: Symbol,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<QuoteData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Deserialize)]
struct RawQuoteEntry {
    symbol: Symbol,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

impl From<RawQuoteEntry> for QuoteEntry {
    fn from(raw: RawQuoteEntry) -> Self {
        Self {
            symbol: raw.symbol,
            data: raw.data.as_ref().and_then(QuoteData::from_value),
            error: raw.error,
        }
    }
}

impl QuoteEntry {
    /// Read an entry back into a result.
    ///
    /// `data` wins over `error`; an entry with neither is treated as an
    /// invalid payload rather than a partially-populated success.
    pub fn into_result(self) -> QuoteResult {
        match (self.data, self.error) {
            (Some(data), _) => QuoteResult::Success(data.into_quote(self.symbol)),
            (None, Some(message)) => {
                QuoteResult::failure(self.symbol, FailureReason::from_message(&message))
            }
            (None, None) => QuoteResult::failure(self.symbol, FailureReason::InvalidPayload),
        }
    }
}

impl From<&QuoteResult> for QuoteEntry {
    fn from(result: &QuoteResult) -> Self {
        match result {
            QuoteResult::Success(quote) => Self {
                symbol: quote.symbol.clone(),
                data: Some(QuoteData::from(quote)),
                error: None,
            },
            QuoteResult::Failure { symbol, reason } => Self {
                symbol: symbol.clone(),
                data: None,
                error: Some(reason.message().to_string()),
            },
        }
    }
}

/// Body of `POST /api/quotes`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub symbols: Vec<String>,
}

/// Response envelope of `POST /api/quotes`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub quotes: Vec<QuoteEntry>,
}

impl BatchResponse {
    pub fn from_results(results: &[QuoteResult]) -> Self {
        Self {
            quotes: results.iter().map(QuoteEntry::from).collect(),
        }
    }

    pub fn into_results(self) -> Vec<QuoteResult> {
        self.quotes.into_iter().map(QuoteEntry::into_result).collect()
    }
}
