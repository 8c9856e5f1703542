//! FIFO buffer between the depth stream task and the sync loop
//!
//! The stream task pushes decoded deltas in wire arrival order; the sync
//! loop takes the whole buffer in one swap so the producer is never blocked
//! for longer than a pointer exchange.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::parser::DepthUpdate;

#[derive(Debug, Default)]
pub struct DepthQueue {
    inner: Mutex<VecDeque<DepthUpdate>>,
}

impl DepthQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one update, preserving arrival order.
    pub fn push(&self, update: DepthUpdate) {
        self.inner.lock().unwrap().push_back(update);
    }

    /// Take and clear all buffered updates.
    pub fn drain(&self) -> VecDeque<DepthUpdate> {
        std::mem::take(&mut *self.inner.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(first: u64, last: u64) -> DepthUpdate {
        DepthUpdate {
            first_update_id: first,
            last_update_id: last,
            bids: Vec::new(),
            asks: Vec::new(),
        }
    }

    #[test]
    fn drain_preserves_fifo_order_and_clears() {
        let queue = DepthQueue::new();
        queue.push(update(1, 2));
        queue.push(update(3, 5));
        queue.push(update(6, 6));

        let drained = queue.drain();
        let firsts: Vec<u64> = drained.iter().map(|u| u.first_update_id).collect();
        assert_eq!(firsts, vec![1, 3, 6]);
        assert!(queue.is_empty());
    }

    #[test]
    fn drain_on_empty_queue_returns_empty() {
        let queue = DepthQueue::new();
        assert!(queue.drain().is_empty());
    }
}
