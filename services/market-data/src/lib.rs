//! Market Data Service
//!
//! Batch quote aggregation over an unreliable upstream provider, and the
//! polling client that keeps a live price cache fresh from it.
//!
//! # Architecture
//!
//! ```text
//!  symbols
//!     │
//! ┌───▼────────┐  one per symbol   ┌───────┐    ┌──────────────┐
//! │ Aggregator ├──────────────────►│ Guard ├───►│ QuoteProvider│
//! └───┬────────┘  (per-item        └───┬───┘    └──────────────┘
//!     │            deadline)           │ normalize
//!     │◄───────────────────────────────┘
//!     │ overall deadline
//! ┌───▼──────────┐  fixed interval  ┌────────────────┐
//! │ BatchSource  │◄─────────────────┤ PollingSession │
//! └──────────────┘                  └───────┬────────┘
//!                                           │ sequence-gated merge
//!                                   ┌───────▼────────┐
//!                                   │ LivePriceCache │
//!                                   └────────────────┘
//! ```

pub mod aggregator;
pub mod cache;
pub mod finnhub;
pub mod guard;
pub mod metrics;
pub mod normalizer;
pub mod poller;
pub mod source;
pub mod upstream;
pub mod watchlist;

// Library version
pub const SERVICE_VERSION: &str = "0.1.0";
