//! Result normalizer
//!
//! Turns a raw provider payload into a `QuoteResult`. Pure: no I/O and no
//! logging, so identical payloads always normalize identically.

use serde_json::Value;
use types::quote::{FailureReason, QuoteResult};
use types::symbol::Symbol;
use types::wire::QuoteData;

/// Validate a raw quote payload.
///
/// A success needs a finite numeric `c`. Missing or non-numeric `d`/`dp`
/// default to zero. An `error` string in the payload is reported as an
/// upstream failure with that message.
pub fn normalize(symbol: &Symbol, payload: &Value) -> QuoteResult {
    if let Some(message) = payload.get("error").and_then(Value::as_str) {
        return QuoteResult::failure(symbol.clone(), FailureReason::Upstream(message.to_string()));
    }

    match QuoteData::from_value(payload) {
        Some(data) => QuoteResult::Success(data.into_quote(symbol.clone())),
        None => QuoteResult::failure(symbol.clone(), FailureReason::InvalidPayload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use types::quote::Quote;

    fn aapl() -> Symbol {
        Symbol::try_new("AAPL").unwrap()
    }

    #[test]
    fn test_full_payload() {
        let result = normalize(&aapl(), &json!({"c": 150.0, "d": 1.0, "dp": 0.5, "h": 151.2}));
        assert_eq!(
            result,
            QuoteResult::Success(Quote {
                symbol: aapl(),
                price: 150.0,
                change: 1.0,
                change_percent: 0.5,
            })
        );
    }

    #[test]
    fn test_missing_change_fields_default_to_zero() {
        let result = normalize(&aapl(), &json!({"c": 99.5}));
        let quote = result.quote().unwrap();
        assert_eq!(quote.price, 99.5);
        assert_eq!(quote.change, 0.0);
        assert_eq!(quote.change_percent, 0.0);

        let result = normalize(&aapl(), &json!({"c": 99.5, "d": null, "dp": "n/a"}));
        let quote = result.quote().unwrap();
        assert_eq!(quote.change, 0.0);
        assert_eq!(quote.change_percent, 0.0);
    }

    #[test]
    fn test_integer_price_accepted() {
        let result = normalize(&aapl(), &json!({"c": 150, "d": 1, "dp": 0}));
        assert_eq!(result.quote().map(|q| q.price), Some(150.0));
    }

    #[test]
    fn test_missing_or_non_numeric_price_is_invalid() {
        for payload in [
            json!({}),
            json!({"d": 1.0, "dp": 0.5}),
            json!({"c": null}),
            json!({"c": "150.0"}),
            json!([150.0]),
            json!(null),
        ] {
            assert_eq!(
                normalize(&aapl(), &payload),
                QuoteResult::failure(aapl(), FailureReason::InvalidPayload),
                "payload {} should be rejected",
                payload
            );
        }
    }

    #[test]
    fn test_error_payload_is_upstream_failure() {
        assert_eq!(
            normalize(&aapl(), &json!({"error": "Not Found"})),
            QuoteResult::failure(aapl(), FailureReason::Upstream("Not Found".into()))
        );
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let payload = json!({"c": 42.0, "dp": -1.25});
        let first = normalize(&aapl(), &payload);
        let second = normalize(&aapl(), &payload);
        assert_eq!(first, second);
    }
}
