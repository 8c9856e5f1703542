//! WebSocket transport
//!
//! One connection per symbol and stream kind, with automatic reconnection.
//! Connection lifecycle events are log-only; they never inject synthetic
//! updates, so any deltas lost across a reconnect surface as a sequence gap
//! that the sync engine heals with a resync.

mod client;
mod depth;
mod trade;

pub use client::WsClient;
pub use depth::DepthStream;
pub use trade::TradeStream;

use std::time::Duration;

const RECONNECT_BASE_MS: u64 = 1_000;
const MAX_BACKOFF_MS: u64 = 60_000;

/// Exponential backoff delay for the given retry attempt, capped at 60 s.
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis((RECONNECT_BASE_MS * 2u64.pow(attempt.min(6))).min(MAX_BACKOFF_MS))
}
