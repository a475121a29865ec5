//! Public client surface: wires configuration, auth, the supervisor, the
//! staging queue, the worker pool, and the subscription registry into one
//! handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

use crate::config::{Config, ProductFamily};
use crate::error::{IntrinioError, Result};
use crate::models::{
  Channel, EquitiesQuote, EquitiesTrade, OptionsQuote, OptionsRefresh, OptionsTrade,
  OptionsUnusualActivity, RealtimeEvent,
};
use crate::queue::StagingQueue;
use crate::registry::SubscriptionRegistry;
use crate::stats::{Counters, StatsSnapshot};
use crate::supervisor::{option_mask, ControlChannel, SharedState, StopSignal, SupervisorState};
use crate::wire::{EquitiesLegacyDecoder, EquitiesV2Decoder, GroupDecoder, OptionsDecoder};
use crate::workers::{self, EventCallback};

/// User-supplied callback set. Equities flows only ever populate
/// `on_trade`/`on_quote` (or `on_raw`, under `bypass_parsing`); options
/// flows may populate all four non-raw callbacks. Which callbacks are
/// present directly determines the options event mask sent on every
/// join/leave, mirroring the upstream SDK's per-callback subscription
/// model.
#[derive(Default, Clone)]
pub struct Callbacks {
  pub on_trade: Option<Arc<dyn Fn(EquitiesOrOptionsTrade, usize) + Send + Sync>>,
  pub on_quote: Option<Arc<dyn Fn(EquitiesOrOptionsQuote, usize) + Send + Sync>>,
  pub on_refresh: Option<Arc<dyn Fn(OptionsRefresh, usize) + Send + Sync>>,
  pub on_unusual_activity: Option<Arc<dyn Fn(OptionsUnusualActivity, usize) + Send + Sync>>,
  /// Receives the raw per-message slice when `bypass_parsing` is set,
  /// instead of `on_trade`/`on_quote` being called.
  pub on_raw: Option<Arc<dyn Fn(Bytes, usize) + Send + Sync>>,
}

/// Either flavor of trade event, dispatched to one shared `on_trade`
/// callback regardless of product family.
#[derive(Debug, Clone, PartialEq)]
pub enum EquitiesOrOptionsTrade {
  Equities(EquitiesTrade),
  Options(OptionsTrade),
}

/// Either flavor of quote event, dispatched to one shared `on_quote`
/// callback regardless of product family.
#[derive(Debug, Clone, PartialEq)]
pub enum EquitiesOrOptionsQuote {
  Equities(EquitiesQuote),
  Options(OptionsQuote),
}

impl Callbacks {
  fn option_mask(&self) -> u8 {
    option_mask(
      self.on_trade.is_some(),
      self.on_quote.is_some(),
      self.on_refresh.is_some(),
      self.on_unusual_activity.is_some(),
    )
  }

  fn into_event_callback(self) -> EventCallback {
    Arc::new(move |event: RealtimeEvent, backlog: usize| match event {
      RealtimeEvent::EquitiesTrade(t) => {
        if let Some(cb) = &self.on_trade {
          cb(EquitiesOrOptionsTrade::Equities(t), backlog);
        }
      }
      RealtimeEvent::EquitiesQuote(q) => {
        if let Some(cb) = &self.on_quote {
          cb(EquitiesOrOptionsQuote::Equities(q), backlog);
        }
      }
      RealtimeEvent::OptionsTrade(t) => {
        if let Some(cb) = &self.on_trade {
          cb(EquitiesOrOptionsTrade::Options(t), backlog);
        }
      }
      RealtimeEvent::OptionsQuote(q) => {
        if let Some(cb) = &self.on_quote {
          cb(EquitiesOrOptionsQuote::Options(q), backlog);
        }
      }
      RealtimeEvent::OptionsRefresh(r) => {
        if let Some(cb) = &self.on_refresh {
          cb(r, backlog);
        }
      }
      RealtimeEvent::OptionsUnusualActivity(u) => {
        if let Some(cb) = &self.on_unusual_activity {
          cb(u, backlog);
        }
      }
      RealtimeEvent::EquitiesRaw(raw) => {
        if let Some(cb) = &self.on_raw {
          cb(raw, backlog);
        }
      }
    })
  }
}

/// Fluent builder for [`RealtimeClient`].
pub struct RealtimeClientBuilder {
  config: Config,
  callbacks: Callbacks,
}

impl RealtimeClientBuilder {
  pub fn new(config: Config) -> Self {
    RealtimeClientBuilder {
      config,
      callbacks: Callbacks::default(),
    }
  }

  pub fn on_trade<F>(mut self, f: F) -> Self
  where
    F: Fn(EquitiesOrOptionsTrade, usize) + Send + Sync + 'static,
  {
    self.callbacks.on_trade = Some(Arc::new(f));
    self
  }

  pub fn on_quote<F>(mut self, f: F) -> Self
  where
    F: Fn(EquitiesOrOptionsQuote, usize) + Send + Sync + 'static,
  {
    self.callbacks.on_quote = Some(Arc::new(f));
    self
  }

  pub fn on_refresh<F>(mut self, f: F) -> Self
  where
    F: Fn(OptionsRefresh, usize) + Send + Sync + 'static,
  {
    self.callbacks.on_refresh = Some(Arc::new(f));
    self
  }

  pub fn on_unusual_activity<F>(mut self, f: F) -> Self
  where
    F: Fn(OptionsUnusualActivity, usize) + Send + Sync + 'static,
  {
    self.callbacks.on_unusual_activity = Some(Arc::new(f));
    self
  }

  pub fn on_raw<F>(mut self, f: F) -> Self
  where
    F: Fn(Bytes, usize) + Send + Sync + 'static,
  {
    self.callbacks.on_raw = Some(Arc::new(f));
    self
  }

  /// Starts the supervisor and worker pool and returns a live client. The
  /// first auth/connect attempt happens in the background; subscriptions
  /// made before `READY` are applied on the first successful connect.
  pub fn start(self) -> RealtimeClient {
    RealtimeClient::start(self.config, self.callbacks)
  }
}

/// A live, running client. Dropping this without calling [`Self::stop`]
/// leaves the supervisor and worker tasks running detached — always call
/// `stop()` (and ideally await the returned handles) before the process
/// exits.
pub struct RealtimeClient {
  config: Arc<Config>,
  registry: Arc<std::sync::Mutex<SubscriptionRegistry>>,
  queue: StagingQueue<Bytes>,
  shared_rx: Arc<AsyncMutex<tokio::sync::mpsc::Receiver<Bytes>>>,
  counters: Arc<Counters>,
  stop: Arc<StopSignal>,
  ready: Arc<AtomicBool>,
  state: SharedState,
  control: ControlChannel,
  control_flag: u8,
  supervisor_handle: JoinHandle<()>,
  worker_handles: Vec<JoinHandle<()>>,
}

impl RealtimeClient {
  fn start(config: Config, callbacks: Callbacks) -> Self {
    let config = Arc::new(config);
    let registry = Arc::new(std::sync::Mutex::new(SubscriptionRegistry::new()));
    let (queue, rx) = StagingQueue::new("intrinio", config.queue_capacity);
    let shared_rx = Arc::new(AsyncMutex::new(rx));
    let counters = Counters::new();
    let stop = StopSignal::new();
    let ready = Arc::new(AtomicBool::new(false));
    let state = SharedState::new();
    let control = ControlChannel::new();
    // Options carry the event mask on every join/leave; equities carries the
    // tradesonly bit instead (see `equities_client.py`'s join/leave byte 1).
    let flag = if config.product.is_options() {
      callbacks.option_mask()
    } else if config.tradesonly {
      1
    } else {
      0
    };

    let decoder: Arc<dyn GroupDecoder> = match config.product {
      ProductFamily::EquitiesV2 => Arc::new(EquitiesV2Decoder::new(config.bypass_parsing)),
      ProductFamily::EquitiesLegacy => Arc::new(EquitiesLegacyDecoder::new(config.bypass_parsing)),
      ProductFamily::Options => Arc::new(OptionsDecoder),
    };
    let callback = callbacks.into_event_callback();
    let worker_handles = workers::spawn_worker_pool(
      config.worker_count,
      shared_rx.clone(),
      decoder,
      callback,
      stop.clone(),
    );

    let http = reqwest::Client::new();
    let supervisor_handle = tokio::spawn(crate::supervisor::run(
      config.clone(),
      http,
      registry.clone(),
      queue.clone(),
      ready.clone(),
      state.clone(),
      stop.clone(),
      counters.clone(),
      control.clone(),
      flag,
    ));

    RealtimeClient {
      config,
      registry,
      queue,
      shared_rx,
      counters,
      stop,
      ready,
      state,
      control,
      control_flag: flag,
      supervisor_handle,
      worker_handles,
    }
  }

  /// Adds channels to the desired subscription set, sending an immediate
  /// JOIN if currently connected or deferring to the next reconnect.
  pub fn join(&self, channels: impl IntoIterator<Item = Channel>) {
    let mut reg = self.registry.lock().unwrap();
    for channel in channels {
      if reg.join(channel.clone()) && self.is_ready() {
        let msg = crate::supervisor::join_message(&channel, self.config.product, self.control_flag);
        self.control.send(msg);
      }
    }
  }

  /// Removes channels from the desired subscription set, sending an
  /// immediate LEAVE if currently connected.
  pub fn leave(&self, channels: impl IntoIterator<Item = Channel>) {
    let mut reg = self.registry.lock().unwrap();
    for channel in channels {
      if reg.leave(&channel) && self.is_ready() {
        let msg = crate::supervisor::leave_message(&channel, self.config.product, self.control_flag);
        self.control.send(msg);
      }
    }
  }

  pub fn leave_all(&self) {
    let mut reg = self.registry.lock().unwrap();
    let channels: Vec<Channel> = reg.desired().iter().cloned().collect();
    reg.leave_all();
    drop(reg);
    if self.is_ready() {
      for channel in channels {
        let msg = crate::supervisor::leave_message(&channel, self.config.product, self.control_flag);
        self.control.send(msg);
      }
    }
  }

  /// Subscribes to the firehose/lobby wildcard.
  pub fn join_firehose(&self) {
    self.join(std::iter::once(Channel::Lobby));
  }

  pub fn leave_firehose(&self) {
    self.leave(std::iter::once(Channel::Lobby));
  }

  pub fn is_ready(&self) -> bool {
    self.ready.load(Ordering::SeqCst)
  }

  pub fn state(&self) -> SupervisorState {
    self.state.get()
  }

  pub fn get_stats(&self) -> StatsSnapshot {
    self.counters.snapshot(&self.shared_rx)
  }

  /// Leaves every channel, stops the supervisor and worker tasks, and
  /// waits for them to finish draining.
  pub async fn stop(self) -> Result<()> {
    self.stop.stop();
    self
      .supervisor_handle
      .await
      .map_err(|e| IntrinioError::Decode(format!("supervisor task panicked: {e}")))?;
    for handle in self.worker_handles {
      let _ = handle.await;
    }
    Ok(())
  }
}

