//! Observable counters. Each is an independent `AtomicU64` rather than a
//! counter behind its own mutex — same no-lost-update guarantee, no lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, Mutex};

/// A point-in-time snapshot returned by `get_stats()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
  pub data_msg_count: u64,
  pub text_msg_count: u64,
  pub queue_depth: usize,
}

#[derive(Debug, Default)]
pub struct Counters {
  pub data_msg_count: AtomicU64,
  pub text_msg_count: AtomicU64,
}

impl Counters {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  /// Queue depth is read with a non-blocking `try_lock`; under the brief
  /// contention of a worker mid-dequeue this reports `0` rather than
  /// blocking the stats caller.
  pub fn snapshot(&self, queue: &Arc<Mutex<mpsc::Receiver<Bytes>>>) -> StatsSnapshot {
    let queue_depth = queue.try_lock().map(|guard| guard.len()).unwrap_or(0);
    StatsSnapshot {
      data_msg_count: self.data_msg_count.load(Ordering::Relaxed),
      text_msg_count: self.text_msg_count.load(Ordering::Relaxed),
      queue_depth,
    }
  }
}
