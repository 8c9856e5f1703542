//! Core order book implementation
//!
//! Uses BTreeMap for sorted price level management: bids descending via
//! `Reverse` keys, asks ascending. A zero quantity removes the level; the
//! level is never stored. Each operation takes the book's single mutex once.

use rust_decimal::Decimal;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{BookSnapshot, Level};
use crate::parser::DepthUpdate;

/// Order book for a single symbol, shared between one writer and one reader
#[derive(Debug)]
pub struct OrderBook {
    symbol: String,
    state: Mutex<BookState>,
}

#[derive(Debug, Default)]
struct BookState {
    /// Bids sorted by price descending (highest first)
    bids: BTreeMap<Reverse<Decimal>, Decimal>,
    /// Asks sorted by price ascending (lowest first)
    asks: BTreeMap<Decimal, Decimal>,
}

impl BookState {
    fn set_bid(&mut self, price: Decimal, qty: Decimal) {
        if price <= Decimal::ZERO || qty < Decimal::ZERO {
            return;
        }
        if qty == Decimal::ZERO {
            self.bids.remove(&Reverse(price));
        } else {
            self.bids.insert(Reverse(price), qty);
        }
    }

    fn set_ask(&mut self, price: Decimal, qty: Decimal) {
        if price <= Decimal::ZERO || qty < Decimal::ZERO {
            return;
        }
        if qty == Decimal::ZERO {
            self.asks.remove(&price);
        } else {
            self.asks.insert(price, qty);
        }
    }
}

impl OrderBook {
    /// Create a new empty order book
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            state: Mutex::new(BookState::default()),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Insert, overwrite, or remove (qty zero) a single bid level.
    /// Non-positive prices and negative quantities are dropped.
    pub fn apply_bid_level(&self, price: Decimal, qty: Decimal) {
        self.state.lock().unwrap().set_bid(price, qty);
    }

    /// Insert, overwrite, or remove (qty zero) a single ask level.
    pub fn apply_ask_level(&self, price: Decimal, qty: Decimal) {
        self.state.lock().unwrap().set_ask(price, qty);
    }

    /// Apply one depth delta in a single critical section. Each level is a
    /// total overwrite, so iteration order within the delta does not matter.
    pub fn apply_depth_delta(&self, update: &DepthUpdate) {
        let mut state = self.state.lock().unwrap();
        for level in &update.bids {
            state.set_bid(level.price, level.qty);
        }
        for level in &update.asks {
            state.set_ask(level.price, level.qty);
        }
    }

    /// Ranked view of the book: best bid/ask plus up to `top_n` levels per
    /// side, in book order. The returned value is detached from live state.
    pub fn snapshot(&self, top_n: usize) -> BookSnapshot {
        let state = self.state.lock().unwrap();

        let mut snap = BookSnapshot {
            symbol: self.symbol.clone(),
            ..BookSnapshot::default()
        };

        if let Some((Reverse(price), qty)) = state.bids.first_key_value() {
            snap.best_bid_px = *price;
            snap.best_bid_qty = *qty;
        }
        if let Some((price, qty)) = state.asks.first_key_value() {
            snap.best_ask_px = *price;
            snap.best_ask_qty = *qty;
        }

        snap.top_bids = state
            .bids
            .iter()
            .take(top_n)
            .map(|(Reverse(price), qty)| Level {
                price: *price,
                qty: *qty,
            })
            .collect();
        snap.top_asks = state
            .asks
            .iter()
            .take(top_n)
            .map(|(price, qty)| Level {
                price: *price,
                qty: *qty,
            })
            .collect();

        snap
    }

    /// True when either side is empty or best bid is strictly below best ask
    /// at strictly positive prices. A crossed book stays stored verbatim;
    /// this check only reports it.
    pub fn is_sane(&self) -> bool {
        let state = self.state.lock().unwrap();

        let (best_bid, best_ask) = match (
            state.bids.first_key_value(),
            state.asks.first_key_value(),
        ) {
            (Some((Reverse(bid), _)), Some((ask, _))) => (*bid, *ask),
            _ => return true,
        };

        if best_bid <= Decimal::ZERO || best_ask <= Decimal::ZERO {
            return false;
        }

        best_bid < best_ask
    }
}
