//! Bounded staging queue with drop-newest overflow semantics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;

/// Non-blocking producer handle for a bounded channel that drops the
/// message being enqueued (not the oldest queued one) when full, logging at
/// most once per second while the queue stays saturated.
#[derive(Clone)]
pub struct StagingQueue<T> {
  tx: mpsc::Sender<T>,
  last_warning_secs: Arc<AtomicU64>,
  label: &'static str,
}

impl<T: Send + 'static> StagingQueue<T> {
  pub fn new(label: &'static str, capacity: usize) -> (Self, mpsc::Receiver<T>) {
    let (tx, rx) = mpsc::channel(capacity);
    (
      StagingQueue {
        tx,
        last_warning_secs: Arc::new(AtomicU64::new(0)),
        label,
      },
      rx,
    )
  }

  /// Attempt to enqueue `item`. Returns `false` (and logs a rate-limited
  /// warning) if the queue is full; the item is dropped, not retried.
  pub fn try_enqueue(&self, item: T) -> bool {
    match self.tx.try_send(item) {
      Ok(()) => true,
      Err(_) => {
        self.warn_overflow();
        false
      }
    }
  }

  fn warn_overflow(&self) {
    let now = SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .map(|d| d.as_secs())
      .unwrap_or(0);
    let last = self.last_warning_secs.load(Ordering::Relaxed);
    if now > last
      && self
        .last_warning_secs
        .compare_exchange(last, now, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
      log::warn!("{} staging queue is full! dropped a message", self.label);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn drops_newest_on_overflow() {
    let (queue, mut rx) = StagingQueue::new("test", 1);
    assert!(queue.try_enqueue(1));
    assert!(!queue.try_enqueue(2));
    assert_eq!(rx.recv().await, Some(1));
  }
}
