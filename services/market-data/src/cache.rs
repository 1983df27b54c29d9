//! Live price cache
//!
//! Consumer-side map of the last good quote per symbol. Entries are only
//! created or replaced by successful results, and only by a cycle newer
//! than the one that last wrote the symbol. Failures never touch an entry,
//! so a symbol keeps its previous price until a fresher success arrives.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use types::quote::QuoteResult;
use types::symbol::Symbol;

/// Cached display value for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LivePrice {
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub last_updated: DateTime<Utc>,
    /// Polling cycle that produced this value.
    pub sequence: u64,
}

/// What a merge did with one result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Entry created or replaced.
    Applied,
    /// A cycle at or after this one already wrote the symbol.
    Stale,
    /// Failure result; the existing entry (if any) stays authoritative.
    Ignored,
}

/// Per-cycle merge tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub applied: usize,
    pub stale: usize,
    pub ignored: usize,
}

/// Symbol-keyed live prices with per-symbol sequence admission.
///
/// The compare-and-write for a symbol happens under that key's entry lock,
/// so cycles completing concurrently cannot interleave a stale write.
#[derive(Debug, Default)]
pub struct LivePriceCache {
    entries: DashMap<Symbol, LivePrice>,
}

impl LivePriceCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Merge one result produced by cycle `sequence`.
    pub fn merge(&self, sequence: u64, result: &QuoteResult) -> MergeOutcome {
        self.merge_at(sequence, result, Utc::now())
    }

    fn merge_at(&self, sequence: u64, result: &QuoteResult, now: DateTime<Utc>) -> MergeOutcome {
        let Some(quote) = result.quote() else {
            return MergeOutcome::Ignored;
        };

        let fresh = LivePrice {
            price: quote.price,
            change: quote.change,
            change_percent: quote.change_percent,
            last_updated: now,
            sequence,
        };

        match self.entries.entry(quote.symbol.clone()) {
            Entry::Occupied(mut occupied) => {
                if sequence <= occupied.get().sequence {
                    return MergeOutcome::Stale;
                }
                occupied.insert(fresh);
                MergeOutcome::Applied
            }
            Entry::Vacant(vacant) => {
                vacant.insert(fresh);
                MergeOutcome::Applied
            }
        }
    }

    /// Merge a whole envelope from cycle `sequence`.
    pub fn merge_all(&self, sequence: u64, results: &[QuoteResult]) -> MergeSummary {
        let now = Utc::now();
        let mut summary = MergeSummary::default();
        for result in results {
            match self.merge_at(sequence, result, now) {
                MergeOutcome::Applied => summary.applied += 1,
                MergeOutcome::Stale => summary.stale += 1,
                MergeOutcome::Ignored => summary.ignored += 1,
            }
        }
        summary
    }

    pub fn get(&self, symbol: &Symbol) -> Option<LivePrice> {
        self.entries.get(symbol).map(|e| e.value().clone())
    }

    /// Point-in-time copy, ordered by symbol.
    pub fn snapshot(&self) -> BTreeMap<Symbol, LivePrice> {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
