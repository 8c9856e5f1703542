//! Snapshot publisher
//!
//! Once per second, samples every symbol's book and trade statistics and
//! appends one CSV row per symbol to the configured sink. Book and trade
//! snapshots are each internally consistent; no atomicity is promised
//! across the two, they are independent metrics.
//!
//! Row format:
//! `ts,symbol,mid,spread,bestBidPx,bestBidQty,bestAskPx,bestAskQty,`
//! `topBidsStr,topAsksStr,lastPrice,lastQty,lastSide,vwapWindow,vwapSession,imbalance`
//! with every numeric in fixed decimal, six fractional digits.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::error::Result;
use crate::orderbook::{BookSnapshot, Level, OrderBook};
use crate::stats::{TradeSnapshot, TradeStats};

const PUBLISH_INTERVAL: Duration = Duration::from_secs(1);

/// One symbol's shared entities, sampled by the publisher
pub struct SymbolFeed {
    pub symbol: String,
    pub book: Arc<OrderBook>,
    pub stats: Arc<TradeStats>,
}

pub struct Publisher {
    feeds: Arc<Vec<SymbolFeed>>,
    top_n: usize,
    log_path: Option<PathBuf>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

enum RowSink {
    File(tokio::fs::File),
    Stdout(tokio::io::Stdout),
}

impl RowSink {
    async fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        match self {
            RowSink::File(file) => {
                file.write_all(line.as_bytes()).await?;
                file.write_all(b"\n").await?;
                file.flush().await
            }
            RowSink::Stdout(out) => {
                out.write_all(line.as_bytes()).await?;
                out.write_all(b"\n").await?;
                out.flush().await
            }
        }
    }
}

impl Publisher {
    /// Rows are emitted in sorted symbol order so output stays stable run
    /// over run.
    pub fn new(mut feeds: Vec<SymbolFeed>, top_n: usize, log_path: Option<PathBuf>) -> Self {
        feeds.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Self {
            feeds: Arc::new(feeds),
            top_n,
            log_path,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Open the sink and spawn the publish loop. Repeated calls are no-ops.
    pub async fn start(&mut self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let mut sink = match &self.log_path {
            Some(path) => RowSink::File(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await?,
            ),
            None => RowSink::Stdout(tokio::io::stdout()),
        };

        let feeds = self.feeds.clone();
        let top_n = self.top_n;
        let running = self.running.clone();

        self.handle = Some(tokio::spawn(async move {
            let mut tick = tokio::time::interval(PUBLISH_INTERVAL);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

            while running.load(Ordering::SeqCst) {
                tick.tick().await;

                for feed in feeds.iter() {
                    let book_snap = feed.book.snapshot(top_n);
                    let trade_snap = feed.stats.snapshot();
                    let row = format_row(&unix_timestamp(), &book_snap, &trade_snap);

                    // An unhealthy book is reported but its row still goes out.
                    if !feed.book.is_sane() {
                        warn!(symbol = %feed.symbol, "order book crossed or invalid");
                    }

                    if let Err(error) = sink.write_line(&row).await {
                        warn!(symbol = %feed.symbol, %error, "failed to write row");
                    }
                }
            }
        }));

        info!(symbols = self.feeds.len(), "publisher started");
        Ok(())
    }

    /// Stop the publish loop. Repeated calls are no-ops.
    pub async fn stop(&mut self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        info!("publisher stopped");
    }
}

/// Epoch seconds with microsecond precision
fn unix_timestamp() -> String {
    let now = chrono::Utc::now();
    format!("{}.{:06}", now.timestamp(), now.timestamp_subsec_micros())
}

/// Fixed decimal with exactly six fractional digits
fn fixed6(value: Decimal) -> String {
    let mut v = value.round_dp(6);
    v.rescale(6);
    v.to_string()
}

/// `price:qty|price:qty|...` with no trailing separator
fn levels_str(levels: &[Level]) -> String {
    levels
        .iter()
        .map(|level| format!("{}:{}", fixed6(level.price), fixed6(level.qty)))
        .collect::<Vec<_>>()
        .join("|")
}

/// Compose one CSV row from independent book and trade samples.
fn format_row(ts: &str, book: &BookSnapshot, trade: &TradeSnapshot) -> String {
    let both_quoted = book.best_bid_px > Decimal::ZERO && book.best_ask_px > Decimal::ZERO;
    let mid = if both_quoted {
        (book.best_bid_px + book.best_ask_px) / Decimal::from(2)
    } else {
        Decimal::ZERO
    };
    let spread = if both_quoted {
        book.best_ask_px - book.best_bid_px
    } else {
        Decimal::ZERO
    };

    let bid_depth: Decimal = book.top_bids.iter().map(|l| l.qty).sum();
    let ask_depth: Decimal = book.top_asks.iter().map(|l| l.qty).sum();
    let total_depth = bid_depth + ask_depth;
    let imbalance = if total_depth > Decimal::ZERO {
        bid_depth / total_depth
    } else {
        Decimal::ZERO
    };

    let last_side = trade.last.side.map_or("none", |side| side.as_str());

    format!(
        "{ts},{symbol},{mid},{spread},{bid_px},{bid_qty},{ask_px},{ask_qty},{top_bids},{top_asks},{last_px},{last_qty},{last_side},{vwap_window},{vwap_session},{imbalance}",
        symbol = book.symbol,
        mid = fixed6(mid),
        spread = fixed6(spread),
        bid_px = fixed6(book.best_bid_px),
        bid_qty = fixed6(book.best_bid_qty),
        ask_px = fixed6(book.best_ask_px),
        ask_qty = fixed6(book.best_ask_qty),
        top_bids = levels_str(&book.top_bids),
        top_asks = levels_str(&book.top_asks),
        last_px = fixed6(trade.last.price),
        last_qty = fixed6(trade.last.qty),
        vwap_window = fixed6(trade.vwap_window),
        vwap_session = fixed6(trade.vwap_session),
        imbalance = fixed6(imbalance),
    )
}
