//! Socket receiver: owns the inbound half of a live connection. Pushes
//! binary frames onto the staging queue, counts text frames, and clears
//! `ready` on close. Never reconnects — that decision belongs to
//! [`crate::supervisor`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use futures_util::stream::SplitStream;
use futures_util::StreamExt;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::queue::StagingQueue;
use crate::stats::Counters;
use crate::supervisor::StopSignal;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Runs until the socket closes, errors, or `stop` fires. tokio-tungstenite
/// reassembles fragmented frames into complete `Message`s before `next()`
/// ever returns one, so the fragment buffer below only matters for raw
/// `Message::Frame` values a caller might see from a non-default codec
/// configuration; kept for conformance with the documented contract.
pub async fn run(
  mut read: SplitStream<WsStream>,
  queue: StagingQueue<Bytes>,
  ready: Arc<AtomicBool>,
  stop: Arc<StopSignal>,
  counters: Arc<Counters>,
) {
  let fragment_buffer: Mutex<Vec<u8>> = Mutex::new(Vec::new());

  loop {
    let next = tokio::select! {
      msg = read.next() => msg,
      _ = stop.wait() => break,
    };

    let message = match next {
      Some(Ok(message)) => message,
      Some(Err(e)) => {
        log::warn!("receiver error: {e}");
        break;
      }
      None => {
        log::info!("socket closed by peer");
        break;
      }
    };

    match message {
      Message::Binary(bytes) => {
        counters.data_msg_count.fetch_add(1, Ordering::Relaxed);
        queue.try_enqueue(Bytes::from(bytes));
      }
      Message::Text(text) => {
        counters.text_msg_count.fetch_add(1, Ordering::Relaxed);
        log::debug!("text frame received: {} bytes", text.len());
      }
      Message::Frame(frame) => {
        let mut buf = fragment_buffer.lock().await;
        buf.extend_from_slice(frame.payload());
        if frame.header().is_final {
          let complete = std::mem::take(&mut *buf);
          counters.data_msg_count.fetch_add(1, Ordering::Relaxed);
          queue.try_enqueue(Bytes::from(complete));
        }
      }
      Message::Close(_) => {
        log::info!("received close frame");
        break;
      }
      Message::Ping(_) | Message::Pong(_) => {}
    }
  }

  ready.store(false, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn queue_receives_binary_frames_until_channel_closes() {
    let (queue, mut rx) = StagingQueue::new("test", 8);
    queue.try_enqueue(Bytes::from_static(b"\x01hello"));
    assert_eq!(rx.recv().await.unwrap(), Bytes::from_static(b"\x01hello"));
  }
}
