use std::sync::Arc;

use market_data::aggregator::{AggregatorConfig, QuoteAggregator};
use market_data::finnhub::{FinnhubClient, FinnhubConfig};
use market_data::metrics::QuoteMetrics;
use market_data::upstream::Integration;
use types::errors::QuoteError;

use crate::config::GatewayConfig;
use crate::error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub integration: Integration,
    pub aggregator_config: AggregatorConfig,
    pub metrics: Arc<QuoteMetrics>,
    aggregator: Result<Arc<QuoteAggregator>, QuoteError>,
}

impl AppState {
    /// The aggregator is built here, once, when the integration is available.
    pub fn new(integration: Integration, aggregator_config: AggregatorConfig) -> Self {
        let metrics = Arc::new(QuoteMetrics::new());
        let aggregator = integration.provider().map(|provider| {
            Arc::new(QuoteAggregator::new(
                provider,
                aggregator_config,
                Arc::clone(&metrics),
            ))
        });

        Self {
            integration,
            aggregator_config,
            metrics,
            aggregator,
        }
    }

    /// Build the upstream client once; a missing key disables the integration.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let integration = match &config.finnhub_api_key {
            None => Integration::unavailable("FINNHUB_API_KEY is not configured"),
            Some(key) => {
                let client = FinnhubClient::new(FinnhubConfig {
                    base_url: config.finnhub_base_url.clone(),
                    api_key: key.clone(),
                    http_timeout: config.upstream_http_timeout,
                });
                match client {
                    Ok(client) => Integration::available(Arc::new(client)),
                    Err(err) => {
                        tracing::error!(error = %err, "Failed to build upstream HTTP client");
                        Integration::unavailable(format!("upstream client error: {}", err))
                    }
                }
            }
        };

        Self::new(integration, config.aggregator)
    }

    /// Shared aggregator, or `IntegrationUnavailable` without a provider.
    pub fn aggregator(&self) -> Result<Arc<QuoteAggregator>, AppError> {
        self.aggregator.clone().map_err(AppError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use market_data::upstream::QuoteProvider;
    use serde_json::{json, Value};
    use types::errors::UpstreamError;
    use types::symbol::Symbol;

    struct StaticProvider;

    #[async_trait]
    impl QuoteProvider for StaticProvider {
        async fn get_quote(&self, _symbol: &Symbol) -> Result<Value, UpstreamError> {
            Ok(json!({"c": 1.0}))
        }

        async fn get_profile(&self, _symbol: &Symbol) -> Result<Value, UpstreamError> {
            Ok(json!({}))
        }
    }

    #[test]
    fn test_aggregator_is_shared_across_requests() {
        let state = AppState::new(
            Integration::available(Arc::new(StaticProvider)),
            AggregatorConfig::default(),
        );
        let cloned = state.clone();

        let first = state.aggregator().unwrap();
        let second = cloned.aggregator().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(first.metrics(), &state.metrics));
    }

    #[test]
    fn test_unavailable_integration_has_no_aggregator() {
        let state = AppState::new(
            Integration::unavailable("FINNHUB_API_KEY is not configured"),
            AggregatorConfig::default(),
        );
        assert!(matches!(
            state.aggregator(),
            Err(AppError::IntegrationUnavailable(_))
        ));
    }
}
