//! Error taxonomy
//!
//! Per-symbol failures travel inside the batch envelope as `FailureReason`.
//! Only the variants of `QuoteError` ever surface at the transport level.

use thiserror::Error;

/// Transport-level errors of the quote service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Integration unavailable: {0}")]
    IntegrationUnavailable(String),
}

/// Failure of a single upstream provider call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("Not Found")]
    NotFound,

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Upstream returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Upstream transport error: {0}")]
    Transport(String),

    #[error("Malformed upstream response: {0}")]
    Malformed(String),

    #[error("{0}")]
    Provider(String),
}

impl UpstreamError {
    /// Expected outcomes for unknown tickers; not worth an alert
    pub fn is_benign(&self) -> bool {
        matches!(self, UpstreamError::NotFound | UpstreamError::InvalidSymbol(_))
    }

    /// Classify a provider-supplied error message
    pub fn from_provider_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("not found") {
            UpstreamError::NotFound
        } else if lower.contains("invalid symbol") {
            UpstreamError::InvalidSymbol(message)
        } else {
            UpstreamError::Provider(message)
        }
    }
}
