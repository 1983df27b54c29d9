//! Upstream quote provider boundary
//!
//! The provider is unreliable and latent: callers must never assume a
//! bounded response time, which is why every call made by the aggregator
//! goes through the per-symbol timeout guard.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use types::errors::{QuoteError, UpstreamError};
use types::symbol::Symbol;

/// Single-symbol lookups against an external market-data provider.
///
/// Payloads are returned raw; validation happens in the normalizer.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Current quote payload, e.g. `{"c": 150.0, "d": 1.0, "dp": 0.5}`
    async fn get_quote(&self, symbol: &Symbol) -> Result<Value, UpstreamError>;

    /// Company profile payload, passed through untouched
    async fn get_profile(&self, symbol: &Symbol) -> Result<Value, UpstreamError>;
}

/// Whether the upstream integration is configured.
///
/// Built once at process start. A missing credential is its own state
/// rather than a null client checked in every handler.
#[derive(Clone)]
pub enum Integration {
    Available(Arc<dyn QuoteProvider>),
    Unavailable { reason: String },
}

impl Integration {
    pub fn available(provider: Arc<dyn QuoteProvider>) -> Self {
        Integration::Available(provider)
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Integration::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Integration::Available(_))
    }

    /// The configured provider, or `IntegrationUnavailable`
    pub fn provider(&self) -> Result<Arc<dyn QuoteProvider>, QuoteError> {
        match self {
            Integration::Available(provider) => Ok(Arc::clone(provider)),
            Integration::Unavailable { reason } => {
                Err(QuoteError::IntegrationUnavailable(reason.clone()))
            }
        }
    }
}

impl fmt::Debug for Integration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Integration::Available(_) => f.write_str("Integration::Available"),
            Integration::Unavailable { reason } => f
                .debug_struct("Integration::Unavailable")
                .field("reason", reason)
                .finish(),
        }
    }
}
