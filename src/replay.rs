//! Replay source: an alternate producer that feeds the same staging queue
//! and decoders as a live socket, reading pre-captured ticks from disk
//! instead of a WebSocket.

use std::collections::BinaryHeap;
use std::cmp::Ordering as CmpOrdering;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use bytes::{Buf, Bytes};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, BufReader};

use crate::error::{IntrinioError, Result};
use crate::models::{Provider, Subprovider};

/// Resolves and downloads a subprovider's capture file for a given date.
/// The HTTP/filesystem step is treated as an opaque collaborator so the
/// merge and parse logic never depends on a particular transport.
pub trait ReplayFileSource: Send + Sync {
  fn fetch(
    &self,
    subprovider: Subprovider,
    date: chrono::NaiveDate,
  ) -> impl std::future::Future<Output = Result<PathBuf>> + Send;
}

/// One decoded tick read off a capture file: the raw group-framed payload
/// (ready to hand to a [`crate::wire::GroupDecoder`] unchanged) plus the
/// nanosecond timestamp it was originally received at.
#[derive(Debug, Clone)]
struct Tick {
  payload: Bytes,
  time_received: u64,
}

/// Reads consecutive `[type:1][length:1][payload:length-2][time_received:8
/// LE]` records from one capture file, re-wrapping each payload as a
/// single-item group (count=1) so the live wire codec applies unchanged.
struct TickFile {
  reader: BufReader<File>,
}

impl TickFile {
  async fn open(path: &PathBuf) -> Result<Self> {
    let file = File::open(path)
      .await
      .map_err(|e| IntrinioError::Decode(format!("cannot open replay file {path:?}: {e}")))?;
    Ok(TickFile {
      reader: BufReader::new(file),
    })
  }

  async fn next_tick(&mut self) -> Result<Option<Tick>> {
    let mut header = [0u8; 2];
    match self.reader.read_exact(&mut header).await {
      Ok(_) => {}
      Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
      Err(e) => return Err(IntrinioError::Decode(format!("replay read error: {e}"))),
    }
    let message_type = header[0];
    let length = header[1] as usize;
    if length < 2 {
      return Err(IntrinioError::Decode("replay tick length must be at least 2".into()));
    }
    let mut rest = vec![0u8; length - 2 + 8];
    self
      .reader
      .read_exact(&mut rest)
      .await
      .map_err(|e| IntrinioError::Decode(format!("truncated replay tick: {e}")))?;

    let payload_len = length - 2;
    let payload_bytes = &rest[..payload_len];
    let mut time_bytes = &rest[payload_len..];
    let time_received = time_bytes.get_u64_le();

    let mut group = Vec::with_capacity(payload_len + 1);
    group.push(message_type);
    group.extend_from_slice(payload_bytes);

    Ok(Some(Tick {
      payload: Bytes::from(wrap_as_group(&group)),
      time_received,
    }))
  }
}

/// Prefixes a single message with the one-byte group count the live
/// decoders expect.
fn wrap_as_group(message: &[u8]) -> Vec<u8> {
  let mut out = Vec::with_capacity(message.len() + 1);
  out.push(1u8);
  out.extend_from_slice(message);
  out
}

struct PendingTick {
  tick: Tick,
  source: usize,
}

impl PartialEq for PendingTick {
  fn eq(&self, other: &Self) -> bool {
    self.tick.time_received == other.tick.time_received
  }
}
impl Eq for PendingTick {}

impl Ord for PendingTick {
  fn cmp(&self, other: &Self) -> CmpOrdering {
    // BinaryHeap is a max-heap; reverse so the smallest time_received pops first.
    other.tick.time_received.cmp(&self.tick.time_received)
  }
}
impl PartialOrd for PendingTick {
  fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
    Some(self.cmp(other))
  }
}

/// Streams the merged, time-ordered tick sequence for `provider` on `date`,
/// pushing each re-wrapped group frame onto `queue`. With
/// `simulated_delay`, paces emission to roughly match the original
/// wall-clock cadence of the capture.
pub async fn replay<S: ReplayFileSource>(
  source: &S,
  provider: Provider,
  date: chrono::NaiveDate,
  queue: crate::queue::StagingQueue<Bytes>,
  simulated_delay: bool,
) -> Result<()> {
  let subproviders = provider.subproviders();
  let mut files = Vec::with_capacity(subproviders.len());
  for subprovider in subproviders {
    match source.fetch(*subprovider, date).await {
      Ok(path) => match TickFile::open(&path).await {
        Ok(f) => files.push(f),
        Err(e) => log::warn!("could not open replay file for {subprovider}: {e}"),
      },
      Err(e) => log::warn!("could not retrieve replay file for {subprovider}: {e}"),
    }
  }

  let mut heap = BinaryHeap::new();
  for (i, file) in files.iter_mut().enumerate() {
    if let Some(tick) = file.next_tick().await? {
      heap.push(PendingTick { tick, source: i });
    }
  }

  let mut wallclock_start: Option<Instant> = None;
  let mut first_time_received: Option<u64> = None;

  while let Some(PendingTick { tick, source }) = heap.pop() {
    if simulated_delay {
      let start = *wallclock_start.get_or_insert_with(Instant::now);
      let first = *first_time_received.get_or_insert(tick.time_received);
      let elapsed_ns = tick.time_received.saturating_sub(first);
      let target = start + Duration::from_nanos(elapsed_ns);
      let now = Instant::now();
      if target > now {
        tokio::time::sleep(target - now).await;
      }
    }

    queue.try_enqueue(tick.payload.clone());

    if let Some(next) = files[source].next_tick().await? {
      heap.push(PendingTick { tick: next, source });
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn wrap_as_group_prefixes_count_of_one() {
    let wrapped = wrap_as_group(&[1, 2, 3]);
    assert_eq!(wrapped, vec![1, 1, 2, 3]);
  }

  #[test]
  fn pending_tick_ordering_is_smallest_time_first() {
    let mut heap = BinaryHeap::new();
    heap.push(PendingTick {
      tick: Tick { payload: Bytes::new(), time_received: 50 },
      source: 0,
    });
    heap.push(PendingTick {
      tick: Tick { payload: Bytes::new(), time_received: 10 },
      source: 1,
    });
    assert_eq!(heap.pop().unwrap().tick.time_received, 10);
    assert_eq!(heap.pop().unwrap().tick.time_received, 50);
  }
}
