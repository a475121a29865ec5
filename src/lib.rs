#![allow(clippy::cognitive_complexity, clippy::large_enum_variant)]
#![warn(missing_debug_implementations, rust_2018_idioms)]

//! # intrinio-realtime
//!
//! Async client for Intrinio's real-time market-data WebSocket feeds:
//! equities (current and legacy wire formats) and options. Handles token
//! auth, reconnection with bounded backoff, subscription management, and
//! dispatch of decoded trades/quotes/refreshes/unusual-activity events to
//! user callbacks under backpressure.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use intrinio_realtime::{Config, Provider, ProductFamily, RealtimeClientBuilder};
//!
//! #[tokio::main]
//! async fn main() {
//!   let config = Config::builder(Provider::Realtime, ProductFamily::EquitiesV2)
//!     .api_key(std::env::var("INTRINIO_API_KEY").unwrap())
//!     .build()
//!     .unwrap();
//!
//!   let client = RealtimeClientBuilder::new(config)
//!     .on_quote(|quote, backlog| println!("{quote:?} (backlog {backlog})"))
//!     .on_trade(|trade, backlog| println!("{trade:?} (backlog {backlog})"))
//!     .start();
//!
//!   client.join_firehose();
//!
//!   tokio::time::sleep(std::time::Duration::from_secs(5)).await;
//!   client.stop().await.unwrap();
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`supervisor`] owns the auth → connect → ready → backoff state machine.
//! - [`receiver`] owns the inbound half of a live socket.
//! - [`workers`] decode group frames off the [`queue::StagingQueue`] and
//!   invoke user callbacks, catching panics so a bad callback can't kill
//!   the pipeline.
//! - [`wire`] holds the three binary decoders (equities v2, equities
//!   legacy, options) behind one [`wire::GroupDecoder`] trait.
//! - [`replay`] is an alternate producer over pre-captured tick files,
//!   useful for backtesting against the same decode/dispatch path.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod queue;
pub mod receiver;
pub mod registry;
pub mod replay;
pub mod stats;
pub mod supervisor;
pub mod wire;
pub mod workers;

pub use client::{Callbacks, EquitiesOrOptionsQuote, EquitiesOrOptionsTrade, RealtimeClient, RealtimeClientBuilder};
pub use config::{Config, ConfigBuilder, ProductFamily};
pub use error::{IntrinioError, Result};
pub use models::{
  Channel, EquitiesQuote, EquitiesTrade, OptionsContract, OptionsQuote, OptionsRefresh,
  OptionsTrade, OptionsUnusualActivity, OptionsUnusualActivitySentiment,
  OptionsUnusualActivityType, Provider, QuoteType, RealtimeEvent, Session, Subprovider,
};
pub use replay::ReplayFileSource;
pub use stats::StatsSnapshot;
pub use supervisor::SupervisorState;
