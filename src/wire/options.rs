use super::GroupDecoder;
use crate::models::{
  scale_int32, scale_uint64, ticks_to_seconds, OptionsContract, OptionsExchange,
  OptionsQuote, OptionsRefresh, OptionsTrade, OptionsUnusualActivity,
  OptionsUnusualActivitySentiment, OptionsUnusualActivityType, RealtimeEvent,
};

const TRADE_SIZE: usize = 72;
const QUOTE_SIZE: usize = 52;
const REFRESH_SIZE: usize = 52;
const UNUSUAL_ACTIVITY_SIZE: usize = 74;

/// Decoder for the options format: every message is a fixed-size frame per
/// message type, with the event-type byte at a known offset rather than a
/// leading length prefix.
#[derive(Debug, Default)]
pub struct OptionsDecoder;

impl GroupDecoder for OptionsDecoder {
  fn decode_group(&self, bytes: &[u8], emit: &mut dyn FnMut(RealtimeEvent)) {
    let Some(&count) = bytes.first() else { return };
    let mut idx = 1usize;
    for _ in 0..count {
      if idx + 23 > bytes.len() {
        break;
      }
      let msg_type = bytes[idx + 22];
      let size = match msg_type {
        0 => TRADE_SIZE,
        1 => QUOTE_SIZE,
        2 => REFRESH_SIZE,
        _ => UNUSUAL_ACTIVITY_SIZE,
      };
      let end = idx + size;
      if end > bytes.len() {
        break;
      }
      let msg = &bytes[idx..end];
      match msg_type {
        0 => {
          if let Some(trade) = decode_trade(msg) {
            emit(RealtimeEvent::OptionsTrade(trade));
          }
        }
        1 => {
          if let Some(quote) = decode_quote(msg) {
            emit(RealtimeEvent::OptionsQuote(quote));
          }
        }
        2 => {
          if let Some(refresh) = decode_refresh(msg) {
            emit(RealtimeEvent::OptionsRefresh(refresh));
          }
        }
        _ => {
          if let Some(ua) = decode_unusual_activity(msg) {
            emit(RealtimeEvent::OptionsUnusualActivity(ua));
          }
        }
      }
      idx = end;
    }
  }
}

fn contract_from(msg: &[u8]) -> Option<OptionsContract> {
  let len = *msg.first()? as usize;
  let raw = msg.get(1..1 + len)?;
  let s = std::str::from_utf8(raw).ok()?;
  Some(OptionsContract::parse(s))
}

fn decode_quote(msg: &[u8]) -> Option<OptionsQuote> {
  if msg.len() < QUOTE_SIZE {
    return None;
  }
  let contract = contract_from(msg)?;
  let price_type = msg[23];
  let ask_price = scale_int32(i32::from_le_bytes(msg[24..28].try_into().ok()?), price_type);
  let ask_size = u32::from_le_bytes(msg[28..32].try_into().ok()?);
  let bid_price = scale_int32(i32::from_le_bytes(msg[32..36].try_into().ok()?), price_type);
  let bid_size = u32::from_le_bytes(msg[36..40].try_into().ok()?);
  let timestamp = ticks_to_seconds(u64::from_le_bytes(msg[40..48].try_into().ok()?));

  Some(OptionsQuote {
    contract,
    ask_price,
    ask_size,
    bid_price,
    bid_size,
    timestamp,
  })
}

fn decode_trade(msg: &[u8]) -> Option<OptionsTrade> {
  if msg.len() < TRADE_SIZE {
    return None;
  }
  let contract = contract_from(msg)?;
  let price_type = msg[23];
  let underlying_price_type = msg[24];
  let price = scale_int32(i32::from_le_bytes(msg[25..29].try_into().ok()?), price_type);
  let size = u32::from_le_bytes(msg[29..33].try_into().ok()?);
  let timestamp = ticks_to_seconds(u64::from_le_bytes(msg[33..41].try_into().ok()?));
  let total_volume = u64::from_le_bytes(msg[41..49].try_into().ok()?);
  let ask_price_at_execution =
    scale_int32(i32::from_le_bytes(msg[49..53].try_into().ok()?), price_type);
  let bid_price_at_execution =
    scale_int32(i32::from_le_bytes(msg[53..57].try_into().ok()?), price_type);
  let underlying_price_at_execution = scale_int32(
    i32::from_le_bytes(msg[57..61].try_into().ok()?),
    underlying_price_type,
  );
  let qualifiers = [msg[61], msg[62], msg[63], msg[64]];
  let exchange = OptionsExchange::from(msg[65]);

  Some(OptionsTrade {
    contract,
    exchange,
    price,
    size,
    timestamp,
    total_volume,
    qualifiers,
    ask_price_at_execution,
    bid_price_at_execution,
    underlying_price_at_execution,
  })
}

fn decode_refresh(msg: &[u8]) -> Option<OptionsRefresh> {
  if msg.len() < REFRESH_SIZE {
    return None;
  }
  let contract = contract_from(msg)?;
  let price_type = msg[23];
  let open_interest = u32::from_le_bytes(msg[24..28].try_into().ok()?);
  let open_price = scale_int32(i32::from_le_bytes(msg[28..32].try_into().ok()?), price_type);
  let close_price = scale_int32(i32::from_le_bytes(msg[32..36].try_into().ok()?), price_type);
  let high_price = scale_int32(i32::from_le_bytes(msg[36..40].try_into().ok()?), price_type);
  let low_price = scale_int32(i32::from_le_bytes(msg[40..44].try_into().ok()?), price_type);

  Some(OptionsRefresh {
    contract,
    open_interest,
    open_price,
    close_price,
    high_price,
    low_price,
  })
}

fn decode_unusual_activity(msg: &[u8]) -> Option<OptionsUnusualActivity> {
  if msg.len() < UNUSUAL_ACTIVITY_SIZE {
    return None;
  }
  let contract = contract_from(msg)?;
  let activity_type = OptionsUnusualActivityType::from(msg[22]);
  let sentiment = OptionsUnusualActivitySentiment::from(msg[23]);
  let price_type = msg[24];
  let underlying_price_type = msg[25];
  let total_value = scale_uint64(u64::from_le_bytes(msg[26..34].try_into().ok()?), price_type);
  let total_size = u32::from_le_bytes(msg[34..38].try_into().ok()?);
  let average_price = scale_int32(i32::from_le_bytes(msg[38..42].try_into().ok()?), price_type);
  let ask_price_at_execution =
    scale_int32(i32::from_le_bytes(msg[42..46].try_into().ok()?), price_type);
  let bid_price_at_execution =
    scale_int32(i32::from_le_bytes(msg[46..50].try_into().ok()?), price_type);
  let underlying_price_at_execution = scale_int32(
    i32::from_le_bytes(msg[50..54].try_into().ok()?),
    underlying_price_type,
  );
  let timestamp = ticks_to_seconds(u64::from_le_bytes(msg[54..62].try_into().ok()?));

  Some(OptionsUnusualActivity {
    contract,
    activity_type,
    sentiment,
    total_value,
    total_size,
    average_price,
    ask_price_at_execution,
    bid_price_at_execution,
    underlying_price_at_execution,
    timestamp,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn build_quote(contract: &str) -> Vec<u8> {
    let mut msg = vec![0u8; QUOTE_SIZE];
    msg[0] = contract.len() as u8;
    msg[1..1 + contract.len()].copy_from_slice(contract.as_bytes());
    msg[22] = 1; // quote
    msg[23] = 0x02; // scale /100
    msg[24..28].copy_from_slice(&1050i32.to_le_bytes()); // ask 10.50
    msg[28..32].copy_from_slice(&5u32.to_le_bytes());
    msg[32..36].copy_from_slice(&1040i32.to_le_bytes()); // bid 10.40
    msg[36..40].copy_from_slice(&7u32.to_le_bytes());
    msg[40..48].copy_from_slice(&1_000_000_000u64.to_le_bytes());
    msg
  }

  #[test]
  fn decodes_quote_with_scaled_prices() {
    let contract = "AAPL_201016C100.00";
    let msg = build_quote(contract);
    let mut group = vec![1u8];
    group.extend_from_slice(&msg);

    let mut events = Vec::new();
    OptionsDecoder.decode_group(&group, &mut |e| events.push(e));
    assert_eq!(events.len(), 1);
    match &events[0] {
      RealtimeEvent::OptionsQuote(q) => {
        assert!((q.ask_price - 10.50).abs() < 1e-9);
        assert!((q.bid_price - 10.40).abs() < 1e-9);
        assert_eq!(q.ask_size, 5);
        assert_eq!(q.timestamp, 1.0);
      }
      other => panic!("unexpected event: {:?}", other),
    }
  }

  #[test]
  fn sentinel_prices_decode_to_nan() {
    let mut msg = build_quote("AAPL_201016C100.00");
    msg[24..28].copy_from_slice(&i32::MAX.to_le_bytes());
    let mut group = vec![1u8];
    group.extend_from_slice(&msg);

    let mut events = Vec::new();
    OptionsDecoder.decode_group(&group, &mut |e| events.push(e));
    match &events[0] {
      RealtimeEvent::OptionsQuote(q) => assert!(q.ask_price.is_nan()),
      other => panic!("unexpected event: {:?}", other),
    }
  }
}
