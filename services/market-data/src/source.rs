//! Where a polling session gets its batches from
//!
//! `QuoteAggregator` serves batches in process; `HttpBatchSource` calls a
//! gateway's batch endpoint over the network.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use types::quote::QuoteResult;
use types::symbol::Symbol;
use types::wire::{BatchRequest, BatchResponse};

use crate::aggregator::QuoteAggregator;

pub const BATCH_PATH: &str = "/api/quotes";

/// A whole batch could not be obtained. Per-symbol failures are not errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("batch transport error: {0}")]
    Transport(String),

    #[error("batch endpoint returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("undecodable batch envelope: {0}")]
    Decode(String),

    #[error("batch not received within {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait BatchSource: Send + Sync {
    async fn fetch_batch(&self, symbols: &[Symbol]) -> Result<Vec<QuoteResult>, FetchError>;
}

#[async_trait]
impl BatchSource for QuoteAggregator {
    async fn fetch_batch(&self, symbols: &[Symbol]) -> Result<Vec<QuoteResult>, FetchError> {
        Ok(self.aggregate(symbols.iter().cloned()).await.results)
    }
}

/// Batch endpoint client.
pub struct HttpBatchSource {
    http: Client,
    url: String,
}

impl HttpBatchSource {
    pub fn new(gateway_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: format!("{}{}", gateway_url.trim_end_matches('/'), BATCH_PATH),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl BatchSource for HttpBatchSource {
    async fn fetch_batch(&self, symbols: &[Symbol]) -> Result<Vec<QuoteResult>, FetchError> {
        let request = BatchRequest {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
        };

        let res = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = res.status().as_u16();
        let body = res
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        decode_envelope(status, &body)
    }
}

/// Decode a batch endpoint response.
///
/// A 504 still carries a well-formed envelope of per-symbol timeouts and
/// partial results, so it is decoded like a 200.
pub fn decode_envelope(status: u16, body: &str) -> Result<Vec<QuoteResult>, FetchError> {
    if status != 200 && status != 504 {
        return Err(FetchError::Status {
            status,
            message: body.trim().to_string(),
        });
    }

    serde_json::from_str::<BatchResponse>(body)
        .map(BatchResponse::into_results)
        .map_err(|e| FetchError::Decode(e.to_string()))
}
