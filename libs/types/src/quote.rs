//! Quote outcome types
//!
//! A `QuoteResult` is the per-symbol outcome of one upstream lookup. Failures
//! are data, not errors: a batch always carries exactly one result per
//! requested symbol, whatever happened to the individual lookups.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::symbol::Symbol;

/// Wire message for a per-item or overall deadline expiry
pub const TIMEOUT_MESSAGE: &str = "Request timeout";

/// Wire message for a payload that carried no usable price
pub const INVALID_PAYLOAD_MESSAGE: &str = "Invalid quote data";

/// A validated price snapshot for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: Symbol,
    /// Current price
    pub price: f64,
    /// Absolute change since previous close
    pub change: f64,
    /// Percent change since previous close
    pub change_percent: f64,
}

/// Why a lookup produced no quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// Provider returned an error or malformed data
    Upstream(String),
    /// Per-item or overall deadline elapsed
    Timeout,
    /// Provider answered but without a usable price
    InvalidPayload,
}

impl FailureReason {
    /// Message carried in the `error` field of a batch entry
    pub fn message(&self) -> &str {
        match self {
            FailureReason::Upstream(msg) => msg,
            FailureReason::Timeout => TIMEOUT_MESSAGE,
            FailureReason::InvalidPayload => INVALID_PAYLOAD_MESSAGE,
        }
    }

    /// Recover a reason from its wire message
    pub fn from_message(message: &str) -> Self {
        match message {
            TIMEOUT_MESSAGE => FailureReason::Timeout,
            INVALID_PAYLOAD_MESSAGE => FailureReason::InvalidPayload,
            other => FailureReason::Upstream(other.to_string()),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of a single symbol's lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QuoteResult {
    Success(Quote),
    Failure { symbol: Symbol, reason: FailureReason },
}

impl QuoteResult {
    pub fn failure(symbol: Symbol, reason: FailureReason) -> Self {
        QuoteResult::Failure { symbol, reason }
    }

    pub fn timeout(symbol: Symbol) -> Self {
        Self::failure(symbol, FailureReason::Timeout)
    }

    pub fn symbol(&self) -> &Symbol {
        match self {
            QuoteResult::Success(quote) => &quote.symbol,
            QuoteResult::Failure { symbol, .. } => symbol,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, QuoteResult::Success(_))
    }

    pub fn quote(&self) -> Option<&Quote> {
        match self {
            QuoteResult::Success(quote) => Some(quote),
            QuoteResult::Failure { .. } => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match self {
            QuoteResult::Success(_) => None,
            QuoteResult::Failure { reason, .. } => Some(reason),
        }
    }
}
