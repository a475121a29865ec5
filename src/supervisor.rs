//! Connection supervisor: owns the auth → connect → ready → backoff state
//! machine, the per-client stop signal, and join/leave control-frame
//! encoding. One supervisor task runs for the lifetime of a client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;

use crate::auth;
use crate::config::{Config, ProductFamily};
use crate::models::{Channel, OptionsContract, Session};
use crate::queue::StagingQueue;
use crate::registry::SubscriptionRegistry;
use crate::stats::Counters;

/// Bounded backoff schedule, seconds. Index saturates at the last slot and
/// resets on every successful connect.
const BACKOFF_SCHEDULE: [u64; 5] = [10, 30, 60, 300, 600];

/// Keepalive interval for the legacy equities flow, which has no
/// transport-level ping. Newer equities and options rely on the socket's
/// own ping/pong.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);

/// Lightweight per-client cancellation scope: an `AtomicBool` flag plus a
/// `Notify` so `wait()` doesn't busy-poll. One client, one scope — running
/// two clients in the same process does not couple their shutdowns.
#[derive(Debug, Default)]
pub struct StopSignal {
  stopped: AtomicBool,
  notify: Notify,
}

impl StopSignal {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn stop(&self) {
    self.stopped.store(true, Ordering::SeqCst);
    self.notify.notify_waiters();
  }

  pub fn is_stopped(&self) -> bool {
    self.stopped.load(Ordering::SeqCst)
  }

  /// Resolves once [`Self::stop`] has been called, immediately if it
  /// already has been.
  pub async fn wait(&self) {
    if self.is_stopped() {
      return;
    }
    self.notify.notified().await;
  }
}

/// Supervisor connection state, surfaced for diagnostics via `get_stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
  Init,
  Authenticating,
  Connecting,
  Ready,
  Backoff,
  Draining,
  Stopped,
}

/// Shared, lock-protected view of the current state for `get_stats()`.
#[derive(Debug, Clone)]
pub struct SharedState(Arc<Mutex<SupervisorState>>);

impl SharedState {
  pub fn new() -> Self {
    SharedState(Arc::new(Mutex::new(SupervisorState::Init)))
  }

  fn set(&self, state: SupervisorState) {
    *self.0.lock().unwrap() = state;
  }

  pub fn get(&self) -> SupervisorState {
    *self.0.lock().unwrap()
  }
}

impl Default for SharedState {
  fn default() -> Self {
    Self::new()
  }
}

/// Tracks the backoff slot index across reconnect attempts. Mirrors the
/// original SDK's `do_backoff`: increments per failure, caps at the last
/// slot, resets to the initial slot on success.
struct Backoff {
  last: i64,
}

impl Backoff {
  fn new() -> Self {
    Backoff { last: -1 }
  }

  fn next_delay(&mut self) -> Duration {
    self.last += 1;
    let i = (self.last as usize).min(BACKOFF_SCHEDULE.len() - 1);
    Duration::from_secs(BACKOFF_SCHEDULE[i])
  }

  fn reset(&mut self) {
    self.last = -1;
  }
}

/// Builds the bit mask for the options join/leave control frame's second
/// byte: bit 0 trades, bit 1 quotes, bit 2 refreshes, bit 3 unusual
/// activity.
pub fn option_mask(on_trade: bool, on_quote: bool, on_refresh: bool, on_unusual_activity: bool) -> u8 {
  let mut mask = 0u8;
  if on_trade {
    mask |= 0b0001;
  }
  if on_quote {
    mask |= 0b0010;
  }
  if on_refresh {
    mask |= 0b0100;
  }
  if on_unusual_activity {
    mask |= 0b1000;
  }
  mask
}

/// The wire spelling of `channel` for `product`: the plain symbol/firehose
/// name for equities, or the server's alternate contract form for options
/// (translating from the legacy 21-byte canonical form if that's what the
/// caller supplied).
fn wire_channel_name(channel: &Channel, product: ProductFamily) -> String {
  match channel {
    Channel::Contract(c) if product.is_options() => OptionsContract::parse(c).alternate(),
    other => other.wire_name(product.is_options()),
  }
}

/// Builds a join control frame. `flag` is the trades-only bit for equities
/// or the option event mask for options.
pub fn join_message(channel: &Channel, product: ProductFamily, flag: u8) -> Vec<u8> {
  let mut msg = vec![74u8, flag];
  msg.extend(wire_channel_name(channel, product).into_bytes());
  msg
}

/// Builds a leave control frame. Equities carries no second byte; options
/// repeats the event mask so the server knows which callback set to drop.
pub fn leave_message(channel: &Channel, product: ProductFamily, flag: u8) -> Vec<u8> {
  let mut msg = vec![76u8];
  if product.is_options() {
    msg.push(flag);
  }
  msg.extend(wire_channel_name(channel, product).into_bytes());
  msg
}

/// Builds the WebSocket upgrade request. Equities v2 negotiates the wire
/// format at the handshake with `UseNewEquitiesFormat: v2` (see
/// `equities_client.py`'s `connect()` headers); legacy equities and options
/// need nothing beyond the token already embedded in the URL.
fn build_connect_request(
  url: String,
  product: ProductFamily,
) -> std::result::Result<
  tokio_tungstenite::tungstenite::handshake::client::Request,
  tokio_tungstenite::tungstenite::Error,
> {
  let mut request = url.into_client_request()?;
  if matches!(product, ProductFamily::EquitiesV2) {
    request
      .headers_mut()
      .insert("UseNewEquitiesFormat", HeaderValue::from_static("v2"));
    request.headers_mut().insert(
      "Client-Information",
      HeaderValue::from_static(crate::auth::CLIENT_INFORMATION),
    );
  }
  Ok(request)
}

type WsStream = tokio_tungstenite::WebSocketStream<
  tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Holds the live socket's outbound sender while connected, `None`
/// otherwise. Lets [`crate::client::RealtimeClient`] push an immediate
/// join/leave frame when ready, instead of waiting for the next reconnect's
/// full resync.
#[derive(Debug, Clone, Default)]
pub struct ControlChannel(Arc<Mutex<Option<mpsc::UnboundedSender<Message>>>>);

impl ControlChannel {
  pub fn new() -> Self {
    Self::default()
  }

  /// Sends `frame` on the live socket, if one is currently connected.
  /// Returns `false` (a no-op, not an error) when there is none — the
  /// caller's registry mutation still applies at the next reconnect.
  pub fn send(&self, frame: Vec<u8>) -> bool {
    match self.0.lock().unwrap().as_ref() {
      Some(tx) => tx.send(Message::Binary(frame.into())).is_ok(),
      None => false,
    }
  }

  fn install(&self, tx: mpsc::UnboundedSender<Message>) {
    *self.0.lock().unwrap() = Some(tx);
  }

  fn clear(&self) {
    *self.0.lock().unwrap() = None;
  }
}

/// Runs the connect/ready/backoff loop until `stop` is signalled. `flag`
/// is the control-frame second byte to use for every join/leave this
/// supervisor issues (tradesonly bit or option mask, depending on
/// `config.product`).
#[allow(clippy::too_many_arguments)]
pub async fn run(
  config: Arc<Config>,
  http: reqwest::Client,
  registry: Arc<Mutex<SubscriptionRegistry>>,
  queue: StagingQueue<bytes::Bytes>,
  ready: Arc<AtomicBool>,
  state: SharedState,
  stop: Arc<StopSignal>,
  counters: Arc<Counters>,
  control: ControlChannel,
  flag: u8,
) {
  let mut backoff = Backoff::new();
  let mut session: Option<Session> = None;

  'outer: loop {
    if stop.is_stopped() {
      break;
    }

    let needs_auth = session.as_ref().map(|s| s.is_stale()).unwrap_or(true);
    if needs_auth {
      state.set(SupervisorState::Authenticating);
      match auth::authenticate(&http, &config).await {
        Ok(s) => session = Some(s),
        Err(e) => {
          log::error!("authentication failed: {e}");
          state.set(SupervisorState::Backoff);
          tokio::time::sleep(backoff.next_delay()).await;
          continue 'outer;
        }
      }
    }
    let token = session.as_ref().unwrap().token().to_string();

    state.set(SupervisorState::Connecting);
    let ws_url = auth::websocket_url(&config, &token);
    let request = match build_connect_request(ws_url, config.product) {
      Ok(request) => request,
      Err(e) => {
        log::error!("cannot build websocket request: {e}");
        state.set(SupervisorState::Backoff);
        tokio::time::sleep(backoff.next_delay()).await;
        continue 'outer;
      }
    };
    let stream = match tokio_tungstenite::connect_async(request).await {
      Ok((stream, _response)) => stream,
      Err(e) => {
        log::error!("cannot connect: {e}");
        state.set(SupervisorState::Backoff);
        tokio::time::sleep(backoff.next_delay()).await;
        continue 'outer;
      }
    };

    log::info!("connected");
    backoff.reset();
    let (write_half, read_half) = stream.split();
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<Message>();
    let mut write_half = write_half;
    let writer_handle: JoinHandle<()> = tokio::spawn(async move {
      while let Some(msg) = cmd_rx.recv().await {
        if write_half.send(msg).await.is_err() {
          break;
        }
      }
    });

    ready.store(true, Ordering::SeqCst);
    state.set(SupervisorState::Ready);
    control.install(cmd_tx.clone());
    resubscribe_all(&registry, &cmd_tx, config.product, flag);

    let heartbeat_handle = if matches!(config.product, ProductFamily::EquitiesLegacy) {
      Some(spawn_heartbeat(cmd_tx.clone(), ready.clone(), stop.clone()))
    } else {
      None
    };

    let queue_for_receiver = queue.clone();
    let ready_for_receiver = ready.clone();
    let stop_for_receiver = stop.clone();
    let counters_for_receiver = counters.clone();
    let receiver_handle = tokio::spawn(async move {
      crate::receiver::run(
        read_half,
        queue_for_receiver,
        ready_for_receiver,
        stop_for_receiver,
        counters_for_receiver,
      )
      .await
    });

    tokio::select! {
      _ = receiver_handle => {
        log::warn!("connection closed, will reconnect");
      }
      _ = stop.wait() => {
        log::info!("stop requested, draining");
        state.set(SupervisorState::Draining);
      }
    }

    ready.store(false, Ordering::SeqCst);
    control.clear();
    if let Some(h) = heartbeat_handle {
      h.abort();
    }

    if stop.is_stopped() {
      leave_everything(&registry, &cmd_tx, config.product, flag);
      tokio::time::sleep(Duration::from_millis(200)).await;
      drop(cmd_tx);
      let _ = writer_handle.await;
      state.set(SupervisorState::Stopped);
      break;
    }

    registry.lock().unwrap().reset_joined();
    drop(cmd_tx);
    let _ = writer_handle.await;
    state.set(SupervisorState::Backoff);
    tokio::time::sleep(backoff.next_delay()).await;
  }
}

/// Sends the full desired subscription set on a fresh connection, before
/// any new event is dispatched for that session, and marks it applied.
fn resubscribe_all(
  registry: &Arc<Mutex<SubscriptionRegistry>>,
  cmd_tx: &mpsc::UnboundedSender<Message>,
  product: ProductFamily,
  flag: u8,
) {
  let mut reg = registry.lock().unwrap();
  reg.reset_joined();
  let (to_join, _) = reg.diff();
  for channel in &to_join {
    let _ = cmd_tx.send(Message::Binary(join_message(channel, product, flag).into()));
  }
  reg.mark_applied();
}

/// Best-effort LEAVE of every joined channel on shutdown.
fn leave_everything(
  registry: &Arc<Mutex<SubscriptionRegistry>>,
  cmd_tx: &mpsc::UnboundedSender<Message>,
  product: ProductFamily,
  flag: u8,
) {
  let reg = registry.lock().unwrap();
  for channel in reg.desired() {
    let _ = cmd_tx.send(Message::Binary(leave_message(channel, product, flag).into()));
  }
}

fn spawn_heartbeat(
  cmd_tx: mpsc::UnboundedSender<Message>,
  ready: Arc<AtomicBool>,
  stop: Arc<StopSignal>,
) -> JoinHandle<()> {
  tokio::spawn(async move {
    let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
    interval.tick().await; // first tick fires immediately, skip it
    loop {
      tokio::select! {
        _ = interval.tick() => {
          if ready.load(Ordering::SeqCst) {
            if cmd_tx.send(Message::Text(String::new().into())).is_err() {
              break;
            }
          }
        }
        _ = stop.wait() => break,
      }
    }
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn equities_join_carries_tradesonly_flag() {
    let msg = join_message(&Channel::symbol("AAPL"), ProductFamily::EquitiesV2, 1);
    assert_eq!(msg[0], 74);
    assert_eq!(msg[1], 1);
    assert_eq!(&msg[2..], b"AAPL");
  }

  #[test]
  fn equities_leave_has_no_flag_byte() {
    let msg = leave_message(&Channel::symbol("AAPL"), ProductFamily::EquitiesV2, 0);
    assert_eq!(msg[0], 76);
    assert_eq!(&msg[1..], b"AAPL");
  }

  #[test]
  fn options_leave_repeats_the_mask_byte() {
    let mask = option_mask(true, true, false, false);
    let msg = leave_message(&Channel::contract("AAPL__260116C00150000"), ProductFamily::Options, mask);
    assert_eq!(msg[0], 76);
    assert_eq!(msg[1], 0b0011);
  }

  #[test]
  fn lobby_wire_name_is_firehose_for_both_families() {
    let msg = join_message(&Channel::Lobby, ProductFamily::EquitiesV2, 0);
    assert_eq!(&msg[2..], b"$FIREHOSE");
  }

  #[test]
  fn backoff_caps_at_last_slot_and_resets() {
    let mut b = Backoff::new();
    let delays: Vec<u64> = (0..7).map(|_| b.next_delay().as_secs()).collect();
    assert_eq!(delays, vec![10, 30, 60, 300, 600, 600, 600]);
    b.reset();
    assert_eq!(b.next_delay().as_secs(), 10);
  }

  #[test]
  fn option_mask_bits_match_callback_flags() {
    assert_eq!(option_mask(false, false, false, false), 0);
    assert_eq!(option_mask(true, false, false, false), 0b0001);
    assert_eq!(option_mask(false, true, false, false), 0b0010);
    assert_eq!(option_mask(false, false, true, false), 0b0100);
    assert_eq!(option_mask(false, false, false, true), 0b1000);
    assert_eq!(option_mask(true, true, true, true), 0b1111);
  }
}
