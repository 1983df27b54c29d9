//! Dashboard view model
//!
//! Static portfolio holdings and watchlist entries, overlaid with whatever
//! the live price cache currently holds. A symbol without a live price
//! falls back to its seed price.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use types::symbol::{dedup_symbols, Symbol};

use crate::cache::LivePrice;

/// Supplies the symbol set a polling session should refresh.
pub trait SymbolSource: Send + Sync {
    fn symbols(&self) -> Vec<Symbol>;
}

impl SymbolSource for Vec<Symbol> {
    fn symbols(&self) -> Vec<Symbol> {
        self.clone()
    }
}

/// A position held in the portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: Symbol,
    pub quantity: f64,
    pub average_cost: f64,
    /// Last known price shipped with the seed data
    pub seed_price: f64,
}

/// An instrument tracked without a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchItem {
    pub symbol: Symbol,
    pub seed_price: f64,
}

/// One rendered dashboard row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRow {
    pub symbol: Symbol,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    /// Quantity held, zero for watchlist-only rows
    pub quantity: f64,
    pub market_value: f64,
    pub unrealized_pnl: f64,
    /// False when the row still shows its seed price
    pub is_live: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Watchlist {
    pub holdings: Vec<Holding>,
    pub watching: Vec<WatchItem>,
}

impl Watchlist {
    pub fn new(holdings: Vec<Holding>, watching: Vec<WatchItem>) -> Self {
        Self { holdings, watching }
    }

    /// Demo portfolio shipped with the dashboard.
    pub fn demo() -> Self {
        let holding = |symbol: &str, quantity: f64, average_cost: f64, seed_price: f64| {
            Symbol::try_new(symbol).map(|symbol| Holding {
                symbol,
                quantity,
                average_cost,
                seed_price,
            })
        };
        let watch = |symbol: &str, seed_price: f64| {
            Symbol::try_new(symbol).map(|symbol| WatchItem { symbol, seed_price })
        };

        Self {
            holdings: [
                holding("AAPL", 50.0, 142.30, 189.84),
                holding("MSFT", 20.0, 310.10, 415.50),
                holding("GOOGL", 15.0, 128.75, 171.95),
                holding("AMZN", 25.0, 131.20, 185.07),
            ]
            .into_iter()
            .flatten()
            .collect(),
            watching: [
                watch("TSLA", 177.48),
                watch("NVDA", 875.28),
                watch("META", 505.95),
                watch("NFLX", 628.78),
            ]
            .into_iter()
            .flatten()
            .collect(),
        }
    }

    /// Rows for every holding then every watchlist entry.
    pub fn rows(&self, live: &BTreeMap<Symbol, LivePrice>) -> Vec<DisplayRow> {
        let held = self.holdings.iter().map(|h| {
            row(&h.symbol, h.seed_price, h.quantity, h.average_cost, live.get(&h.symbol))
        });
        let watched = self
            .watching
            .iter()
            .map(|w| row(&w.symbol, w.seed_price, 0.0, 0.0, live.get(&w.symbol)));
        held.chain(watched).collect()
    }

    /// Total market value of the holdings.
    pub fn portfolio_value(&self, live: &BTreeMap<Symbol, LivePrice>) -> f64 {
        self.rows(live).iter().map(|r| r.market_value).sum()
    }
}

impl SymbolSource for Watchlist {
    fn symbols(&self) -> Vec<Symbol> {
        dedup_symbols(
            self.holdings
                .iter()
                .map(|h| h.symbol.clone())
                .chain(self.watching.iter().map(|w| w.symbol.clone())),
        )
    }
}

fn row(
    symbol: &Symbol,
    seed_price: f64,
    quantity: f64,
    average_cost: f64,
    live: Option<&LivePrice>,
) -> DisplayRow {
    let (price, change, change_percent, is_live) = match live {
        Some(lp) => (lp.price, lp.change, lp.change_percent, true),
        None => (seed_price, 0.0, 0.0, false),
    };
    DisplayRow {
        symbol: symbol.clone(),
        price,
        change,
        change_percent,
        quantity,
        market_value: price * quantity,
        unrealized_pnl: (price - average_cost) * quantity,
        is_live,
    }
}
