//! Integration tests exercising whole flows across modules: wire decoding,
//! subscription diffing, queue backpressure, control-frame construction,
//! and replay merge ordering.

use std::collections::HashMap;
use std::path::PathBuf;

use bytes::Bytes;
use chrono::NaiveDate;

use intrinio_realtime::{Channel, OptionsContract, OptionsUnusualActivityType, Provider, QuoteType, RealtimeEvent, Subprovider};

// --- equities v2: byte-exact group decode --------------------------------

mod wire_decode {
  use super::*;
  use intrinio_realtime::wire::{EquitiesV2Decoder, GroupDecoder};

  fn build_trade(symbol: &str, price: f32, size: u32, total_volume: u32) -> Vec<u8> {
    let mut msg = vec![0u8, 0u8, symbol.len() as u8];
    msg.extend_from_slice(symbol.as_bytes());
    msg.push(6); // subprovider: IEX
    msg.extend_from_slice(&1u16.to_le_bytes());
    msg.extend_from_slice(&price.to_le_bytes());
    msg.extend_from_slice(&size.to_le_bytes());
    msg.extend_from_slice(&1_700_000_000_000u64.to_le_bytes());
    msg.extend_from_slice(&total_volume.to_le_bytes());
    msg.push(0); // no condition
    msg[1] = msg.len() as u8;
    msg
  }

  fn build_quote(symbol: &str, message_type: u8, price: f32, size: u32) -> Vec<u8> {
    let mut msg = vec![message_type, 0u8, symbol.len() as u8];
    msg.extend_from_slice(symbol.as_bytes());
    msg.push(6);
    msg.extend_from_slice(&1u16.to_le_bytes());
    msg.extend_from_slice(&price.to_le_bytes());
    msg.extend_from_slice(&size.to_le_bytes());
    msg.extend_from_slice(&1_700_000_000_000u64.to_le_bytes());
    msg.push(0);
    msg[1] = msg.len() as u8;
    msg
  }

  #[test]
  fn equities_v2_group_decodes_trade_and_quote_in_order() {
    let trade = build_trade("AAPL", 301.62, 100, 1_000);
    let quote = build_quote("AAPL", 1, 301.60, 50);

    let mut group = vec![2u8];
    group.extend_from_slice(&trade);
    group.extend_from_slice(&quote);

    let mut events = Vec::new();
    EquitiesV2Decoder::new(false).decode_group(&group, &mut |e| events.push(e));
    assert_eq!(events.len(), 2);

    match &events[0] {
      RealtimeEvent::EquitiesTrade(t) => {
        assert_eq!(t.symbol, "AAPL");
        assert_eq!(t.size, 100);
        assert_eq!(t.total_volume, 1_000);
      }
      other => panic!("expected trade, got {other:?}"),
    }
    match &events[1] {
      RealtimeEvent::EquitiesQuote(q) => {
        assert_eq!(q.symbol, "AAPL");
        assert_eq!(q.quote_type, QuoteType::Ask);
        assert_eq!(q.size, 50);
      }
      other => panic!("expected quote, got {other:?}"),
    }
  }

  #[test]
  fn quote_message_type_two_maps_to_bid() {
    // only message_type byte 1 means ask; 2 (or any other non-zero) is bid.
    let quote = build_quote("AAPL", 2, 10.0, 1);
    let mut group = vec![1u8];
    group.extend_from_slice(&quote);

    let mut events = Vec::new();
    EquitiesV2Decoder::new(false).decode_group(&group, &mut |e| events.push(e));
    match &events[0] {
      RealtimeEvent::EquitiesQuote(q) => assert_eq!(q.quote_type, QuoteType::Bid),
      other => panic!("expected quote, got {other:?}"),
    }
  }
}

// --- subscription registry + control frames: reconnect resync -----------

mod subscriptions {
  use super::*;
  use intrinio_realtime::config::ProductFamily;
  use intrinio_realtime::registry::SubscriptionRegistry;
  use intrinio_realtime::supervisor::join_message;

  #[test]
  fn join_then_leave_same_channel_nets_to_no_pending_diff() {
    let mut reg = SubscriptionRegistry::new();
    reg.join(Channel::symbol("AAPL"));
    reg.leave(&Channel::symbol("AAPL"));
    let (to_join, to_leave) = reg.diff();
    assert!(to_join.is_empty());
    assert!(to_leave.is_empty());
  }

  #[test]
  fn reconnect_resync_emits_two_joins_for_the_full_desired_set() {
    let mut reg = SubscriptionRegistry::new();
    reg.join(Channel::symbol("A"));
    reg.join(Channel::symbol("B"));
    reg.mark_applied();

    // simulate the socket dropping and a fresh connect.
    reg.reset_joined();
    let (to_join, to_leave) = reg.diff();
    let mut names: Vec<String> = to_join.iter().map(|c| c.to_string()).collect();
    names.sort();
    assert_eq!(names, vec!["A".to_string(), "B".to_string()]);
    assert!(to_leave.is_empty());

    let frames: Vec<Vec<u8>> = to_join
      .iter()
      .map(|c| join_message(c, ProductFamily::EquitiesV2, 0))
      .collect();
    assert_eq!(frames.len(), 2);
    for frame in &frames {
      assert_eq!(frame[0], 74);
    }
  }
}

// --- bounded staging queue: drop-newest overflow --------------------------

mod queue_backpressure {
  use intrinio_realtime::queue::StagingQueue;

  #[tokio::test]
  async fn overflow_drops_exactly_one_and_delivers_the_rest_once() {
    let (queue, mut rx) = StagingQueue::new("test", 2);
    assert!(queue.try_enqueue(1u32));
    assert!(queue.try_enqueue(2u32));
    assert!(!queue.try_enqueue(3u32)); // queue full, third item dropped

    let mut received = Vec::new();
    while let Ok(item) = rx.try_recv() {
      received.push(item);
    }
    assert_eq!(received, vec![1, 2]);
  }
}

// --- options unusual activity type mapping --------------------------------

mod options_unusual_activity {
  use super::*;

  #[test]
  fn activity_type_bytes_map_to_named_variants() {
    assert_eq!(OptionsUnusualActivityType::from(3u8), OptionsUnusualActivityType::Block);
    assert_eq!(OptionsUnusualActivityType::from(4u8), OptionsUnusualActivityType::Sweep);
    assert_eq!(OptionsUnusualActivityType::from(5u8), OptionsUnusualActivityType::Large);
    assert_eq!(OptionsUnusualActivityType::from(6u8), OptionsUnusualActivityType::UnusualSweep);
  }
}

// --- options contract canonical/alternate round trip ----------------------

mod contract_round_trip {
  use super::*;

  #[test]
  fn alternate_to_canonical_to_alternate_round_trips() {
    let alternate = "AAPL_201016C100.00";
    let contract = OptionsContract::parse(alternate);
    assert_eq!(contract.alternate(), alternate);
  }

  #[test]
  fn canonical_to_alternate_to_canonical_round_trips() {
    let canonical = "AAPL__201016C00100000";
    let contract = OptionsContract::parse(canonical);
    let back = OptionsContract::parse(&contract.alternate());
    assert_eq!(back.canonical(), canonical);
  }
}

// --- replay: k-way merge across subprovider files -------------------------

mod replay_merge {
  use super::*;
  use intrinio_realtime::error::{IntrinioError, Result};
  use intrinio_realtime::queue::StagingQueue;
  use intrinio_realtime::replay::{replay, ReplayFileSource};

  struct FixedFileSource(HashMap<Subprovider, PathBuf>);

  impl ReplayFileSource for FixedFileSource {
    fn fetch(
      &self,
      subprovider: Subprovider,
      _date: NaiveDate,
    ) -> impl std::future::Future<Output = Result<PathBuf>> + Send {
      let result = self
        .0
        .get(&subprovider)
        .cloned()
        .ok_or_else(|| IntrinioError::Decode("no file for subprovider".into()));
      async move { result }
    }
  }

  fn write_tick_file(name: &str, times: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("intrinio_replay_test_{}_{}.bin", std::process::id(), name));
    let mut bytes = Vec::new();
    for &t in times {
      bytes.push(0u8); // message type
      bytes.push(3u8); // length: payload(1) + trailer placeholder(2)
      bytes.push(t); // 1-byte payload, doubles as the time marker for assertions
      bytes.extend_from_slice(&(t as u64).to_le_bytes());
    }
    std::fs::write(&path, &bytes).expect("write tick fixture");
    path
  }

  fn extract_marker(frame: &Bytes) -> u8 {
    // [count=1][message_type][payload...]; payload is our 1-byte marker.
    frame[2]
  }

  #[tokio::test]
  async fn merges_two_subprovider_streams_into_ascending_time_order() {
    let path_a = write_tick_file("a", &[5, 20, 30]);
    let path_b = write_tick_file("b", &[10, 15, 40]);

    let mut files = HashMap::new();
    files.insert(Subprovider::Utp, path_a.clone());
    files.insert(Subprovider::CtaA, path_b.clone());
    let source = FixedFileSource(files);

    let (queue, mut rx) = StagingQueue::new("replay-test", 64);
    let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    replay(&source, Provider::DelayedSip, date, queue, false)
      .await
      .expect("replay succeeds even when some subproviders have no file");

    let mut observed = Vec::new();
    while let Ok(frame) = rx.try_recv() {
      observed.push(extract_marker(&frame));
    }

    assert_eq!(observed, vec![5, 10, 15, 20, 30, 40]);

    let _ = std::fs::remove_file(path_a);
    let _ = std::fs::remove_file(path_b);
  }
}
