//! Per-symbol trade statistics
//!
//! Tracks the last trade, the session VWAP, and a rolling 5-minute VWAP.
//! One writer (the trade stream) and one reader (the publisher) share an
//! instance through its internal mutex.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;

/// Span of the rolling VWAP window
pub const VWAP_WINDOW: Duration = Duration::from_secs(300);

/// Aggressor side of a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(self) -> &'static str {
        match self {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
        }
    }

    /// `isBuyerMaker = true` means the aggressor was the seller.
    fn from_buyer_maker(is_buyer_maker: bool) -> Self {
        if is_buyer_maker {
            TradeSide::Sell
        } else {
            TradeSide::Buy
        }
    }
}

/// Most recent trade; `side` is `None` until the first trade arrives
#[derive(Debug, Clone, Copy, Default)]
pub struct LastTrade {
    pub price: Decimal,
    pub qty: Decimal,
    pub side: Option<TradeSide>,
}

/// Consistent copy of the current statistics
#[derive(Debug, Clone, Default)]
pub struct TradeSnapshot {
    pub last: LastTrade,
    pub vwap_session: Decimal,
    pub vwap_window: Decimal,
}

#[derive(Debug)]
struct TimedTrade {
    at: Instant,
    price: Decimal,
    qty: Decimal,
}

#[derive(Debug, Default)]
struct StatsState {
    last: LastTrade,
    sum_px_qty: Decimal,
    sum_qty: Decimal,
    window: VecDeque<TimedTrade>,
}

#[derive(Debug, Default)]
pub struct TradeStats {
    state: Mutex<StatsState>,
}

impl TradeStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a trade. Non-positive price or quantity is dropped.
    pub fn on_trade(&self, price: Decimal, qty: Decimal, is_buyer_maker: bool) {
        self.on_trade_at(Instant::now(), price, qty, is_buyer_maker);
    }

    fn on_trade_at(&self, now: Instant, price: Decimal, qty: Decimal, is_buyer_maker: bool) {
        if price <= Decimal::ZERO || qty <= Decimal::ZERO {
            return;
        }

        let mut state = self.state.lock().unwrap();

        state.last = LastTrade {
            price,
            qty,
            side: Some(TradeSide::from_buyer_maker(is_buyer_maker)),
        };
        state.sum_px_qty += price * qty;
        state.sum_qty += qty;

        state.window.push_back(TimedTrade { at: now, price, qty });
        if let Some(cutoff) = now.checked_sub(VWAP_WINDOW) {
            while state.window.front().is_some_and(|t| t.at < cutoff) {
                state.window.pop_front();
            }
        }
    }

    pub fn snapshot(&self) -> TradeSnapshot {
        self.snapshot_at(Instant::now())
    }

    fn snapshot_at(&self, now: Instant) -> TradeSnapshot {
        let state = self.state.lock().unwrap();

        let vwap_session = if state.sum_qty > Decimal::ZERO {
            state.sum_px_qty / state.sum_qty
        } else {
            Decimal::ZERO
        };

        // Entries may have expired since the last trade pruned the deque;
        // the cutoff is re-applied here.
        let cutoff = now.checked_sub(VWAP_WINDOW);
        let mut win_px_qty = Decimal::ZERO;
        let mut win_qty = Decimal::ZERO;
        for trade in &state.window {
            if cutoff.map_or(true, |c| trade.at >= c) {
                win_px_qty += trade.price * trade.qty;
                win_qty += trade.qty;
            }
        }
        let vwap_window = if win_qty > Decimal::ZERO {
            win_px_qty / win_qty
        } else {
            Decimal::ZERO
        };

        TradeSnapshot {
            last: state.last,
            vwap_session,
            vwap_window,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn session_vwap_is_quantity_weighted() {
        let stats = TradeStats::new();
        stats.on_trade(dec!(100), dec!(1), false);
        stats.on_trade(dec!(110), dec!(2), false);
        stats.on_trade(dec!(120), dec!(1), true);

        let snap = stats.snapshot();
        // (100 + 220 + 120) / 4
        assert_eq!(snap.vwap_session, dec!(110));
        assert_eq!(snap.last.price, dec!(120));
        assert_eq!(snap.last.qty, dec!(1));
    }

    #[test]
    fn window_vwap_excludes_expired_trades() {
        let stats = TradeStats::new();
        let base = Instant::now();

        stats.on_trade_at(base, dec!(100), dec!(1), false);
        stats.on_trade_at(base + Duration::from_secs(10), dec!(110), dec!(2), false);
        stats.on_trade_at(base + Duration::from_secs(400), dec!(120), dec!(1), true);

        let snap = stats.snapshot_at(base + Duration::from_secs(401));
        assert_eq!(snap.vwap_session, dec!(110));
        // Only the trade at t=400 is younger than the 300 s cutoff.
        assert_eq!(snap.vwap_window, dec!(120));
        assert_eq!(snap.last.side, Some(TradeSide::Sell));
    }

    #[test]
    fn window_filters_even_without_new_trades() {
        let stats = TradeStats::new();
        let base = Instant::now();

        stats.on_trade_at(base, dec!(100), dec!(1), false);

        let early = stats.snapshot_at(base + Duration::from_secs(1));
        assert_eq!(early.vwap_window, dec!(100));

        // No trade has pruned the deque, the snapshot cutoff must.
        let late = stats.snapshot_at(base + Duration::from_secs(301));
        assert_eq!(late.vwap_window, Decimal::ZERO);
        assert_eq!(late.vwap_session, dec!(100));
    }

    #[test]
    fn side_follows_buyer_maker_convention() {
        let stats = TradeStats::new();
        stats.on_trade(dec!(10), dec!(1), true);
        assert_eq!(stats.snapshot().last.side, Some(TradeSide::Sell));
        stats.on_trade(dec!(10), dec!(1), false);
        assert_eq!(stats.snapshot().last.side, Some(TradeSide::Buy));
    }

    #[test]
    fn invalid_trades_are_dropped() {
        let stats = TradeStats::new();
        stats.on_trade(Decimal::ZERO, dec!(1), false);
        stats.on_trade(dec!(10), dec!(-1), false);

        let snap = stats.snapshot();
        assert!(snap.last.side.is_none());
        assert_eq!(snap.vwap_session, Decimal::ZERO);
        assert_eq!(snap.vwap_window, Decimal::ZERO);
    }

    #[test]
    fn empty_stats_snapshot_is_all_zero() {
        let snap = TradeStats::new().snapshot();
        assert_eq!(snap.last.price, Decimal::ZERO);
        assert_eq!(snap.vwap_session, Decimal::ZERO);
    }
}
