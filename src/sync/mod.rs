//! Order book synchronization
//!
//! Reconciles one REST snapshot with one live delta stream per symbol and
//! keeps the book gap-free, resynchronizing on any discontinuity.

mod engine;
mod queue;
mod worker;

pub use engine::SyncEngine;
pub use queue::DepthQueue;
pub use worker::SyncWorker;

/// Depth limit used for initial and resync snapshots
pub const SNAPSHOT_DEPTH: u16 = 10;
