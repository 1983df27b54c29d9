//! Finnhub REST client
//!
//! Implements `QuoteProvider` over `GET /quote` and `GET /stock/profile2`.
//! The API key travels in the `X-Finnhub-Token` header so it never shows
//! up in request URLs or trace output.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Request, Url};
use serde_json::Value;
use tracing::debug;
use types::errors::UpstreamError;
use types::symbol::Symbol;

use crate::upstream::QuoteProvider;

pub const DEFAULT_BASE_URL: &str = "https://finnhub.io/api/v1";

const TOKEN_HEADER: &str = "X-Finnhub-Token";

/// Longest raw body echoed back in an error message
const MAX_ERROR_BODY: usize = 200;

/// Connection settings for the Finnhub API.
#[derive(Clone)]
pub struct FinnhubConfig {
    pub base_url: String,
    pub api_key: String,
    /// Hard cap on a single HTTP exchange; the per-item guard is usually tighter
    pub http_timeout: Duration,
}

impl FinnhubConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            http_timeout: Duration::from_secs(5),
        }
    }
}

impl fmt::Debug for FinnhubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinnhubConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

pub struct FinnhubClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl FinnhubClient {
    pub fn new(config: FinnhubConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(config.http_timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    /// `GET {base}{path}?symbol=..` with the key in the token header.
    fn request(&self, path: &str, symbol: &Symbol) -> Result<Request, UpstreamError> {
        let url = Url::parse_with_params(
            &format!("{}{}", self.base_url, path),
            &[("symbol", symbol.as_str())],
        )
        .map_err(|e| UpstreamError::Transport(format!("invalid upstream url: {}", e)))?;

        self.http
            .get(url)
            .header(TOKEN_HEADER, &self.api_key)
            .build()
            .map_err(|e| UpstreamError::Transport(e.to_string()))
    }

    async fn fetch(&self, path: &str, symbol: &Symbol) -> Result<Value, UpstreamError> {
        let request = self.request(path, symbol)?;
        let res = self
            .http
            .execute(request)
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = res.status().as_u16();
        let body = res
            .text()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        debug!(%symbol, path, status, "Upstream response received");
        interpret_response(status, &body)
    }
}

#[async_trait]
impl QuoteProvider for FinnhubClient {
    async fn get_quote(&self, symbol: &Symbol) -> Result<Value, UpstreamError> {
        self.fetch("/quote", symbol).await
    }

    async fn get_profile(&self, symbol: &Symbol) -> Result<Value, UpstreamError> {
        self.fetch("/stock/profile2", symbol).await
    }
}

/// Map an HTTP status and body onto a payload or a typed upstream error.
pub fn interpret_response(status: u16, body: &str) -> Result<Value, UpstreamError> {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let provider_message = parsed
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string);

    if status == 404 {
        return Err(UpstreamError::NotFound);
    }

    if !(200..300).contains(&status) {
        let message = provider_message.unwrap_or_else(|| truncate(body.trim(), MAX_ERROR_BODY));
        return Err(UpstreamError::Status { status, message });
    }

    if let Some(message) = provider_message {
        return Err(UpstreamError::from_provider_message(message));
    }

    parsed.ok_or_else(|| UpstreamError::Malformed(truncate(body.trim(), MAX_ERROR_BODY)))
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_sent_as_header_not_query() {
        let client = FinnhubClient::new(FinnhubConfig {
            base_url: "https://finnhub.test/api/v1/".to_string(),
            api_key: "secret-key".to_string(),
            http_timeout: Duration::from_secs(1),
        })
        .unwrap();
        let symbol = Symbol::try_new("BRK.B").unwrap();

        let request = client.request("/quote", &symbol).unwrap();

        assert_eq!(
            request.url().as_str(),
            "https://finnhub.test/api/v1/quote?symbol=BRK.B"
        );
        assert!(!request.url().as_str().contains("secret-key"));
        assert_eq!(
            request.headers().get(TOKEN_HEADER).unwrap(),
            "secret-key"
        );
    }

    #[test]
    fn test_success_body_passes_through() {
        let value = interpret_response(200, r#"{"c":150.0,"d":1.0,"dp":0.5}"#).unwrap();
        assert_eq!(value, json!({"c": 150.0, "d": 1.0, "dp": 0.5}));
    }

    #[test]
    fn test_404_is_not_found() {
        assert_eq!(interpret_response(404, ""), Err(UpstreamError::NotFound));
    }

    #[test]
    fn test_error_field_in_ok_body_is_classified() {
        assert_eq!(
            interpret_response(200, r#"{"error":"Not Found"}"#),
            Err(UpstreamError::NotFound)
        );
        assert_eq!(
            interpret_response(200, r#"{"error":"You don't have access to this resource."}"#),
            Err(UpstreamError::Provider(
                "You don't have access to this resource.".into()
            ))
        );
    }

    #[test]
    fn test_non_success_status_keeps_provider_message() {
        assert_eq!(
            interpret_response(429, r#"{"error":"API limit reached. Please try again later."}"#),
            Err(UpstreamError::Status {
                status: 429,
                message: "API limit reached. Please try again later.".into()
            })
        );
        assert_eq!(
            interpret_response(502, "Bad Gateway"),
            Err(UpstreamError::Status {
                status: 502,
                message: "Bad Gateway".into()
            })
        );
    }

    #[test]
    fn test_non_json_ok_body_is_malformed() {
        assert!(matches!(
            interpret_response(200, "<html>maintenance</html>"),
            Err(UpstreamError::Malformed(_))
        ));
    }

    #[test]
    fn test_truncate_long_bodies() {
        let long = "x".repeat(500);
        let out = truncate(&long, 10);
        assert_eq!(out, format!("{}...", "x".repeat(10)));
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn test_config_debug_redacts_key() {
        let config = FinnhubConfig::new("super-secret");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("REDACTED"));
    }
}
