//! bookfeed
//!
//! Maintains real-time Level-2 order books and trade statistics for a set of
//! spot symbols and publishes a consolidated per-symbol CSV row once per
//! second. The core is the snapshot/stream reconciliation engine that keeps
//! each book gap-free against the exchange's incremental depth feed.

pub mod config;
pub mod error;
pub mod orderbook;
pub mod parser;
pub mod publisher;
pub mod rest;
pub mod stats;
pub mod sync;
pub mod websocket;

pub use config::Config;
pub use error::{FeedError, Result};
pub use orderbook::{BookSnapshot, Level, OrderBook};
pub use parser::{DepthSnapshot, DepthUpdate, TradeEvent};
pub use publisher::{Publisher, SymbolFeed};
pub use rest::{RestClient, SnapshotSource};
pub use stats::{LastTrade, TradeSide, TradeSnapshot, TradeStats};
pub use sync::{DepthQueue, SyncEngine, SyncWorker};
pub use websocket::{DepthStream, TradeStream};
