//! REST snapshot client
//!
//! Fetches L2 book snapshots from the exchange's `/depth` endpoint. The
//! `SnapshotSource` trait is the seam the sync engine depends on, so tests
//! can script snapshot responses without a network.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{FeedError, Result};
use crate::orderbook::OrderBook;
use crate::parser::DepthSnapshot;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of L2 book snapshots tagged with `lastUpdateId`
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Apply the snapshot's levels onto `book` and return the server's
    /// `lastUpdateId`. The book is not cleared first; each returned level
    /// overwrites its price, and later deltas overwrite the rest. On error
    /// the book keeps whatever the applied levels produced.
    async fn load_snapshot(&self, symbol: &str, book: &OrderBook, limit: u16) -> Result<u64>;
}

/// Snapshot source backed by the exchange REST API
pub struct RestClient {
    client: reqwest::Client,
    endpoint: String,
}

impl RestClient {
    pub fn new(endpoint: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SnapshotSource for RestClient {
    async fn load_snapshot(&self, symbol: &str, book: &OrderBook, limit: u16) -> Result<u64> {
        let url = format!(
            "{}/depth?symbol={}&limit={}",
            self.endpoint,
            symbol.to_uppercase(),
            limit
        );
        debug!(symbol, %url, "requesting book snapshot");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FeedError::RestStatus(response.status().as_u16()));
        }

        let snapshot: DepthSnapshot = response.json().await?;

        for level in &snapshot.bids {
            book.apply_bid_level(level.price, level.qty);
        }
        for level in &snapshot.asks {
            book.apply_ask_level(level.price, level.qty);
        }

        Ok(snapshot.last_update_id)
    }
}
