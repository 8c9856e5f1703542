//! Snapshot/stream reconciliation state machine
//!
//! One engine per symbol. In the unsynchronized phase the engine searches the
//! backlog for the delta that bridges the snapshot's `lastUpdateId`, then
//! replays forward under strict continuity. Once synchronized, every delta
//! must start exactly one past the last applied id; anything else forces a
//! fresh snapshot. The backlog is long-lived: an entry is popped only when it
//! has been applied or is definitively stale, so deltas survive passes where
//! reconciliation cannot yet succeed.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{info, warn};

use super::SNAPSHOT_DEPTH;
use crate::orderbook::OrderBook;
use crate::parser::DepthUpdate;
use crate::rest::SnapshotSource;

pub struct SyncEngine {
    symbol: String,
    book: Arc<OrderBook>,
    source: Arc<dyn SnapshotSource>,
    /// `lastUpdateId` of the most recent snapshot (S)
    snapshot_id: u64,
    /// `u` of the most recently applied delta (L)
    last_applied: u64,
    synchronized: bool,
    backlog: VecDeque<DepthUpdate>,
}

impl SyncEngine {
    pub fn new(symbol: &str, book: Arc<OrderBook>, source: Arc<dyn SnapshotSource>) -> Self {
        Self {
            symbol: symbol.to_string(),
            book,
            source,
            snapshot_id: 0,
            last_applied: 0,
            synchronized: false,
            backlog: VecDeque::new(),
        }
    }

    pub fn is_synchronized(&self) -> bool {
        self.synchronized
    }

    pub fn snapshot_id(&self) -> u64 {
        self.snapshot_id
    }

    pub fn last_applied(&self) -> u64 {
        self.last_applied
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// Append drained deltas to the persistent backlog.
    pub fn extend_backlog<I>(&mut self, batch: I)
    where
        I: IntoIterator<Item = DepthUpdate>,
    {
        self.backlog.extend(batch);
    }

    /// Fetch a fresh snapshot and fall back to the unsynchronized phase.
    /// The backlog is kept: it may already hold the bridge for the new
    /// snapshot. On fetch failure the old snapshot id stays in place and the
    /// next pass retries.
    pub async fn resync(&mut self) {
        match self
            .source
            .load_snapshot(&self.symbol, &self.book, SNAPSHOT_DEPTH)
            .await
        {
            Ok(last_update_id) => {
                info!(
                    symbol = %self.symbol,
                    last_update_id,
                    "book snapshot loaded"
                );
                self.snapshot_id = last_update_id;
            }
            Err(error) => {
                warn!(symbol = %self.symbol, %error, "snapshot fetch failed, will retry");
            }
        }
        self.last_applied = 0;
        self.synchronized = false;
    }

    /// One reconciliation pass over the backlog.
    pub async fn process_backlog(&mut self) {
        if self.synchronized {
            self.apply_live().await;
        } else {
            self.bridge_snapshot().await;
        }
    }

    /// Unsynchronized phase: line the backlog up with the snapshot.
    async fn bridge_snapshot(&mut self) {
        // Deltas entirely covered by the snapshot are stale.
        while self
            .backlog
            .front()
            .is_some_and(|d| d.last_update_id <= self.snapshot_id)
        {
            self.backlog.pop_front();
        }

        let target = self.snapshot_id + 1;

        let Some(front) = self.backlog.front() else {
            return;
        };

        // The snapshot predates everything buffered: the bridge delta can
        // never arrive, only a newer snapshot helps.
        if front.first_update_id > target {
            let backlog_first = front.first_update_id;
            warn!(
                symbol = %self.symbol,
                snapshot_id = self.snapshot_id,
                backlog_first,
                "snapshot is behind the buffered stream, refetching"
            );
            self.resync().await;
            return;
        }

        // Locate the delta whose id range contains snapshot_id + 1.
        let Some(bridge) = self
            .backlog
            .iter()
            .position(|d| d.first_update_id <= target && target <= d.last_update_id)
        else {
            // Not buffered yet; keep waiting.
            return;
        };
        // Entries before the bridge are superseded by the snapshot.
        for _ in 0..bridge {
            self.backlog.pop_front();
        }

        // Replay from the bridge under strict continuity. Nothing is popped
        // until it has been applied.
        let mut applied = self.snapshot_id;
        while let Some(delta) = self.backlog.front() {
            if applied == self.snapshot_id {
                if !(delta.first_update_id <= target && target <= delta.last_update_id) {
                    return;
                }
            } else if delta.first_update_id != applied + 1 {
                let (first, last) = (delta.first_update_id, delta.last_update_id);
                warn!(
                    symbol = %self.symbol,
                    expected = applied + 1,
                    first,
                    last,
                    "gap while replaying buffered deltas"
                );
                return;
            }

            self.book.apply_depth_delta(delta);
            applied = delta.last_update_id;
            self.backlog.pop_front();
        }

        self.last_applied = applied;
        self.synchronized = true;
        info!(symbol = %self.symbol, last_applied = applied, "book synchronized");
    }

    /// Synchronized phase: strict continuity, resync on any break.
    async fn apply_live(&mut self) {
        while let Some(delta) = self.backlog.front() {
            if delta.first_update_id == self.last_applied + 1 {
                self.book.apply_depth_delta(delta);
                self.last_applied = delta.last_update_id;
                self.backlog.pop_front();
            } else {
                let (first, last) = (delta.first_update_id, delta.last_update_id);
                warn!(
                    symbol = %self.symbol,
                    expected = self.last_applied + 1,
                    first,
                    last,
                    "live continuity broken, resyncing"
                );
                self.resync().await;
                return;
            }
        }
    }
}
