//! Depth stream
//!
//! Subscribes to `<symbol>@depth@100ms`, decodes each frame into a
//! `DepthUpdate`, and enqueues it in arrival order. Undecodable frames and
//! inverted id ranges are dropped here so the sync engine can assume
//! `U <= u` throughout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{backoff_delay, WsClient};
use crate::parser::DepthUpdate;
use crate::sync::DepthQueue;

pub struct DepthStream {
    symbol: String,
    url: String,
    queue: Arc<DepthQueue>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl DepthStream {
    pub fn new(symbol: &str, ws_endpoint: &str, queue: Arc<DepthQueue>) -> Self {
        Self {
            symbol: symbol.to_string(),
            url: format!("{}/{}@depth@100ms", ws_endpoint.trim_end_matches('/'), symbol),
            queue,
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
        let queue = self.queue.clone();
        let running = self.running.clone();

        self.handle = Some(tokio::spawn(async move {
            run_stream(symbol, url, queue, running).await;
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
        info!(symbol = %self.symbol, "depth stream stopped");
    }
}

async fn run_stream(symbol: String, url: String, queue: Arc<DepthQueue>, running: Arc<AtomicBool>) {
    let mut attempt = 0u32;

    while running.load(Ordering::SeqCst) {
        let mut client = WsClient::new();
        match client.connect(&url).await {
            Ok(()) => {
                info!(symbol = %symbol, "depth stream connected");
                attempt = 0;
                loop {
                    match client.recv().await {
                        Ok(Some(text)) => enqueue_frame(&symbol, &text, &queue),
                        Ok(None) => continue,
                        Err(error) => {
                            warn!(symbol = %symbol, %error, "depth stream disconnected");
                            break;
                        }
                    }
                }
            }
            Err(error) => {
                warn!(symbol = %symbol, %error, "depth stream connect failed");
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
            "reconnecting depth stream"
        );
        tokio::time::sleep(delay).await;
    }
}

fn enqueue_frame(symbol: &str, raw: &str, queue: &DepthQueue) {
    match serde_json::from_str::<DepthUpdate>(raw) {
        Ok(update) => {
            if update.first_update_id > update.last_update_id {
                debug!(
                    symbol,
                    first = update.first_update_id,
                    last = update.last_update_id,
                    "dropping inverted update range"
                );
                return;
            }
            queue.push(update);
        }
        Err(error) => {
            // Frames without U/u (or otherwise malformed) are ignored.
            debug!(symbol, %error, "ignoring undecodable depth frame");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueues_valid_frames_in_order() {
        let queue = DepthQueue::new();
        enqueue_frame(
            "btcusdt",
            r#"{"U": 5, "u": 7, "b": [["100.0", "1.0"]], "a": []}"#,
            &queue,
        );
        enqueue_frame("btcusdt", r#"{"U": 8, "u": 9}"#, &queue);

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].first_update_id, 5);
        assert_eq!(drained[1].first_update_id, 8);
    }

    #[test]
    fn drops_frames_missing_ids() {
        let queue = DepthQueue::new();
        enqueue_frame("btcusdt", r#"{"result": null, "id": 1}"#, &queue);
        enqueue_frame("btcusdt", "not json", &queue);
        assert!(queue.is_empty());
    }

    #[test]
    fn drops_inverted_ranges() {
        let queue = DepthQueue::new();
        enqueue_frame("btcusdt", r#"{"U": 10, "u": 7}"#, &queue);
        assert!(queue.is_empty());
    }
}
