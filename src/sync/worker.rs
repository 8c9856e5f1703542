//! Sync worker lifecycle
//!
//! Owns one symbol's depth stream, ingest queue, and reconciliation loop.
//! Startup is WS-first: the depth stream must be buffering before the first
//! snapshot request goes out, otherwise deltas between snapshot time and
//! stream-open time are lost with no way to detect the loss.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

use super::{DepthQueue, SyncEngine};
use crate::orderbook::OrderBook;
use crate::rest::SnapshotSource;
use crate::websocket::DepthStream;

/// Cadence of the drain/reconcile loop
const DRAIN_INTERVAL: Duration = Duration::from_millis(20);

pub struct SyncWorker {
    symbol: String,
    book: Arc<OrderBook>,
    source: Arc<dyn SnapshotSource>,
    queue: Arc<DepthQueue>,
    depth_stream: DepthStream,
    running: Arc<AtomicBool>,
    /// Advisory mirror of the engine's state; the loop owns the truth.
    synchronized: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SyncWorker {
    pub fn new(
        symbol: &str,
        book: Arc<OrderBook>,
        source: Arc<dyn SnapshotSource>,
        ws_endpoint: &str,
    ) -> Self {
        let queue = Arc::new(DepthQueue::new());
        let depth_stream = DepthStream::new(symbol, ws_endpoint, queue.clone());
        Self {
            symbol: symbol.to_string(),
            book,
            source,
            queue,
            depth_stream,
            running: Arc::new(AtomicBool::new(false)),
            synchronized: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    pub fn is_synchronized(&self) -> bool {
        self.synchronized.load(Ordering::SeqCst)
    }

    /// Start the depth stream, load the initial snapshot, and spawn the
    /// reconciliation loop. Repeated calls are no-ops.
    pub async fn start(&mut self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        // The stream buffers into the queue from here on.
        self.depth_stream.start();

        let mut engine = SyncEngine::new(&self.symbol, self.book.clone(), self.source.clone());
        // Initial snapshot. A failure is logged inside and the loop recovers
        // through its own resync path.
        engine.resync().await;

        let running = self.running.clone();
        let synchronized = self.synchronized.clone();
        let queue = self.queue.clone();

        self.handle = Some(tokio::spawn(async move {
            let mut tick = tokio::time::interval(DRAIN_INTERVAL);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

            while running.load(Ordering::SeqCst) {
                tick.tick().await;
                engine.extend_backlog(queue.drain());
                engine.process_backlog().await;
                synchronized.store(engine.is_synchronized(), Ordering::SeqCst);
            }
        }));

        info!(symbol = %self.symbol, "sync worker started");
    }

    /// Stop the stream and join the loop. Repeated calls are no-ops.
    pub async fn stop(&mut self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        self.depth_stream.stop();

        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        self.synchronized.store(false, Ordering::SeqCst);

        info!(symbol = %self.symbol, "sync worker stopped");
    }
}
