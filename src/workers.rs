//! Worker pool: dequeues raw group frames, decodes them, and dispatches
//! each decoded event to the user's callback alongside the current backlog
//! depth. Callback panics are caught and logged, never propagated — a bad
//! callback must not kill the receive pipeline.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::models::RealtimeEvent;
use crate::supervisor::StopSignal;
use crate::wire::GroupDecoder;

/// How long a worker blocks on an empty queue before re-checking the stop
/// signal.
const DEQUEUE_TIMEOUT: Duration = Duration::from_secs(1);

/// User callback invoked once per decoded event, given the event and the
/// number of raw frames still queued behind it.
pub type EventCallback = Arc<dyn Fn(RealtimeEvent, usize) + Send + Sync>;

/// Spawns `worker_count` tasks that share one frame queue, decoding with
/// `decoder` and invoking `callback` for every event. Each task exits once
/// `stop` is notified and the queue is drained. `shared_rx` is also held by
/// the caller so `get_stats()` can read the live backlog depth.
pub fn spawn_worker_pool(
  worker_count: usize,
  shared_rx: Arc<Mutex<mpsc::Receiver<Bytes>>>,
  decoder: Arc<dyn GroupDecoder>,
  callback: EventCallback,
  stop: Arc<StopSignal>,
) -> Vec<JoinHandle<()>> {
  (0..worker_count.max(1))
    .map(|id| {
      let shared_rx = shared_rx.clone();
      let decoder = decoder.clone();
      let callback = callback.clone();
      let stop = stop.clone();
      tokio::spawn(async move { worker_loop(id, shared_rx, decoder, callback, stop).await })
    })
    .collect()
}

async fn worker_loop(
  id: usize,
  rx: Arc<Mutex<mpsc::Receiver<Bytes>>>,
  decoder: Arc<dyn GroupDecoder>,
  callback: EventCallback,
  stop: Arc<StopSignal>,
) {
  log::debug!("worker {id} starting");
  loop {
    if stop.is_stopped() {
      break;
    }
    let dequeued = {
      let mut guard = rx.lock().await;
      tokio::time::timeout(DEQUEUE_TIMEOUT, guard.recv())
        .await
        .ok()
        .map(|frame| (frame, guard.len()))
    };
    let (frame, backlog) = match dequeued {
      Some((Some(frame), backlog)) => (frame, backlog),
      Some((None, _)) => break, // sender dropped, queue is gone for good
      None => continue,        // timed out, re-check stop signal
    };
    decoder.decode_group(&frame, &mut |event| {
      if let Err(panic) =
        std::panic::catch_unwind(AssertUnwindSafe(|| callback(event, backlog)))
      {
        let msg = panic
          .downcast_ref::<&str>()
          .map(|s| s.to_string())
          .or_else(|| panic.downcast_ref::<String>().cloned())
          .unwrap_or_else(|| "non-string panic payload".to_string());
        log::error!("worker {id} callback panicked: {msg}");
      }
    });
  }
  log::debug!("worker {id} stopped");
}
