//! Instrument identifiers

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Ticker symbol for a tradable instrument (e.g., "AAPL", "BRK.B")
///
/// Case-sensitive and opaque: no normalisation beyond trimming surrounding
/// whitespace is applied, so "aapl" and "AAPL" are distinct symbols.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a symbol, returning None if it is empty or blank
    pub fn try_new(symbol: impl Into<String>) -> Option<Self> {
        let s = symbol.into();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == s.len() {
            Some(Self(s))
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Get the symbol string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// De-duplicate symbols with set semantics.
///
/// The first occurrence of each symbol fixes its position, so the output
/// order is the request order with repeats removed.
pub fn dedup_symbols<I>(symbols: I) -> Vec<Symbol>
where
    I: IntoIterator<Item = Symbol>,
{
    let mut seen = HashSet::new();
    symbols
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sym(s: &str) -> Symbol {
        Symbol::try_new(s).unwrap()
    }

    #[test]
    fn test_blank_symbols_rejected() {
        assert!(Symbol::try_new("").is_none());
        assert!(Symbol::try_new("   ").is_none());
        assert!(Symbol::try_new("\t\n").is_none());
    }

    #[test]
    fn test_symbol_trimmed_but_case_preserved() {
        assert_eq!(sym("  aapl ").as_str(), "aapl");
        assert_ne!(sym("aapl"), sym("AAPL"));
    }

    #[test]
    fn test_symbol_serializes_as_plain_string() {
        let json = serde_json::to_string(&sym("MSFT")).unwrap();
        assert_eq!(json, "\"MSFT\"");

        let back: Symbol = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sym("MSFT"));
    }

    #[test]
    fn test_dedup_keeps_first_occurrence_order() {
        let input = vec![sym("MSFT"), sym("AAPL"), sym("MSFT"), sym("TSLA"), sym("AAPL")];
        let out = dedup_symbols(input);
        assert_eq!(out, vec![sym("MSFT"), sym("AAPL"), sym("TSLA")]);
    }

    #[test]
    fn test_dedup_empty() {
        assert!(dedup_symbols(Vec::new()).is_empty());
    }

    proptest! {
        #[test]
        fn prop_dedup_yields_each_symbol_once(raw in proptest::collection::vec("[A-Z]{1,4}", 0..40)) {
            let symbols: Vec<Symbol> = raw.iter().map(|s| sym(s)).collect();
            let unique: HashSet<&Symbol> = symbols.iter().collect();

            let out = dedup_symbols(symbols.clone());

            prop_assert_eq!(out.len(), unique.len());
            for s in &out {
                prop_assert_eq!(out.iter().filter(|o| *o == s).count(), 1);
            }
        }
    }
}
