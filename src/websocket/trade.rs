//! Trade stream
//!
//! Subscribes to `<symbol>@trade` and forwards each decoded trade to the
//! symbol's `TradeStats`. Frames missing the price, quantity, or maker flag
//! are dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{backoff_delay, WsClient};
use crate::parser::TradeEvent;
use crate::stats::TradeStats;

pub struct TradeStream {
    symbol: String,
    url: String,
    stats: Arc<TradeStats>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TradeStream {
    pub fn new(symbol: &str, ws_endpoint: &str, stats: Arc<TradeStats>) -> Self {
        Self {
            symbol: symbol.to_string(),
            url: format!("{}/{}@trade", ws_endpoint.trim_end_matches('/'), symbol),
            stats,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Spawn the receive task. Repeated calls are no-ops.
    pub fn start(&mut self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let symbol = self.symbol.clone();
        let url = self.url.clone();
        let stats = self.stats.clone();
        let running = self.running.clone();

        self.handle = Some(tokio::spawn(async move {
            run_stream(symbol, url, stats, running).await;
        }));
    }

    /// Stop the receive task. Repeated calls are no-ops.
    pub fn stop(&mut self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        info!(symbol = %self.symbol, "trade stream stopped");
    }
}

async fn run_stream(symbol: String, url: String, stats: Arc<TradeStats>, running: Arc<AtomicBool>) {
    let mut attempt = 0u32;

    while running.load(Ordering::SeqCst) {
        let mut client = WsClient::new();
        match client.connect(&url).await {
            Ok(()) => {
                info!(symbol = %symbol, "trade stream connected");
                attempt = 0;
                loop {
                    match client.recv().await {
                        Ok(Some(text)) => record_frame(&symbol, &text, &stats),
                        Ok(None) => continue,
                        Err(error) => {
                            warn!(symbol = %symbol, %error, "trade stream disconnected");
                            break;
                        }
                    }
                }
            }
            Err(error) => {
                warn!(symbol = %symbol, %error, "trade stream connect failed");
            }
        }

        if !running.load(Ordering::SeqCst) {
            break;
        }
        let delay = backoff_delay(attempt);
        attempt += 1;
        warn!(
            symbol = %symbol,
            attempt,
            delay_ms = delay.as_millis() as u64,
            "reconnecting trade stream"
        );
        tokio::time::sleep(delay).await;
    }
}

fn record_frame(symbol: &str, raw: &str, stats: &TradeStats) {
    match serde_json::from_str::<TradeEvent>(raw) {
        Ok(trade) => stats.on_trade(trade.price, trade.qty, trade.is_buyer_maker),
        Err(error) => {
            debug!(symbol, %error, "ignoring undecodable trade frame");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn records_valid_trades() {
        let stats = TradeStats::new();
        record_frame(
            "btcusdt",
            r#"{"p": "50000.50", "q": "0.5", "m": false}"#,
            &stats,
        );

        let snap = stats.snapshot();
        assert_eq!(snap.last.price, dec!(50000.50));
        assert_eq!(snap.last.qty, dec!(0.5));
    }

    #[test]
    fn ignores_malformed_trades() {
        let stats = TradeStats::new();
        record_frame("btcusdt", r#"{"p": "50000.50", "q": "0.5"}"#, &stats);
        record_frame("btcusdt", "garbage", &stats);
        assert!(stats.snapshot().last.side.is_none());
    }
}
