//! Gateway configuration, read from the environment.
//!
//! | Variable                   | Default                      |
//! |----------------------------|------------------------------|
//! | `FINNHUB_API_KEY`          | unset: integration disabled  |
//! | `FINNHUB_BASE_URL`         | `https://finnhub.io/api/v1`  |
//! | `GATEWAY_ADDR`             | `0.0.0.0:8080`               |
//! | `QUOTE_ITEM_TIMEOUT_MS`    | `2000`                       |
//! | `QUOTE_BATCH_TIMEOUT_MS`   | `3000`                       |
//! | `UPSTREAM_HTTP_TIMEOUT_MS` | `5000`                       |

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use market_data::aggregator::AggregatorConfig;
use market_data::finnhub::DEFAULT_BASE_URL;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{key} must be greater than zero")]
    ZeroDuration { key: &'static str },
}

#[derive(Clone)]
pub struct GatewayConfig {
    pub addr: SocketAddr,
    pub finnhub_api_key: Option<String>,
    pub finnhub_base_url: String,
    pub upstream_http_timeout: Duration,
    pub aggregator: AggregatorConfig,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AggregatorConfig::default();

        Ok(Self {
            addr: parse_or(&lookup, "GATEWAY_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?,
            finnhub_api_key: lookup("FINNHUB_API_KEY")
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            finnhub_base_url: lookup("FINNHUB_BASE_URL")
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            upstream_http_timeout: millis_or(
                &lookup,
                "UPSTREAM_HTTP_TIMEOUT_MS",
                Duration::from_millis(5000),
            )?,
            aggregator: AggregatorConfig {
                per_item_deadline: millis_or(
                    &lookup,
                    "QUOTE_ITEM_TIMEOUT_MS",
                    defaults.per_item_deadline,
                )?,
                overall_deadline: millis_or(
                    &lookup,
                    "QUOTE_BATCH_TIMEOUT_MS",
                    defaults.overall_deadline,
                )?,
            },
        })
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("addr", &self.addr)
            .field(
                "finnhub_api_key",
                &self.finnhub_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("finnhub_base_url", &self.finnhub_base_url)
            .field("upstream_http_timeout", &self.upstream_http_timeout)
            .field("aggregator", &self.aggregator)
            .finish()
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key,
            value: raw.clone(),
        }),
        None => Ok(default),
    }
}

fn millis_or<F>(lookup: &F, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let ms: u64 = parse_or(lookup, key, default.as_millis() as u64)?;
    if ms == 0 {
        return Err(ConfigError::ZeroDuration { key });
    }
    Ok(Duration::from_millis(ms))
}
