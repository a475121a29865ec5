use bytes::Bytes;

use super::GroupDecoder;
use crate::models::{EquitiesQuote, EquitiesTrade, QuoteType, RealtimeEvent, Subprovider};

/// Decoder for the "v2" equities format: symbol-length-prefixed messages
/// carrying a subprovider byte and a UTF-16 market center.
#[derive(Debug, Default)]
pub struct EquitiesV2Decoder {
  bypass_parsing: bool,
}

impl EquitiesV2Decoder {
  pub fn new(bypass_parsing: bool) -> Self {
    EquitiesV2Decoder { bypass_parsing }
  }
}

impl GroupDecoder for EquitiesV2Decoder {
  fn decode_group(&self, bytes: &[u8], emit: &mut dyn FnMut(RealtimeEvent)) {
    let Some(&count) = bytes.first() else { return };
    let mut idx = 1usize;
    for _ in 0..count {
      if idx + 2 > bytes.len() {
        break;
      }
      let message_type = bytes[idx];
      let message_length = bytes[idx + 1] as usize;
      let end = idx + message_length;
      if message_length == 0 || end > bytes.len() {
        break;
      }
      let msg = &bytes[idx..end];
      if self.bypass_parsing {
        emit(RealtimeEvent::EquitiesRaw(Bytes::copy_from_slice(&msg[..msg.len() - 1])));
      } else if message_type == 0 {
        if let Some(trade) = decode_trade(msg) {
          emit(RealtimeEvent::EquitiesTrade(trade));
        }
      } else if let Some(quote) = decode_quote(msg) {
        emit(RealtimeEvent::EquitiesQuote(quote));
      }
      idx = end;
    }
  }
}

fn decode_quote(msg: &[u8]) -> Option<EquitiesQuote> {
  if msg.len() < 3 {
    return None;
  }
  let quote_type = if msg[0] == 1 { QuoteType::Ask } else { QuoteType::Bid };
  let symbol_length = msg[2] as usize;
  let symbol_end = 3 + symbol_length;
  if msg.len() < symbol_end + 19 {
    return None;
  }
  let symbol = std::str::from_utf8(&msg[3..symbol_end]).ok()?.to_string();
  let subprovider = Subprovider::from(msg[symbol_end]);
  let market_center = decode_utf16_market_center(&msg[symbol_end + 1..symbol_end + 3]);

  let price = f32::from_le_bytes(msg[symbol_end + 3..symbol_end + 7].try_into().ok()?);
  let size = u32::from_le_bytes(msg[symbol_end + 7..symbol_end + 11].try_into().ok()?);
  let timestamp = u64::from_le_bytes(msg[symbol_end + 11..symbol_end + 19].try_into().ok()?);

  let condition_length_idx = symbol_end + 19;
  let condition_length = *msg.get(condition_length_idx)? as usize;
  let condition_start = condition_length_idx + 1;
  let condition = if condition_length > 0 {
    msg.get(condition_start..condition_start + condition_length)
      .and_then(|b| std::str::from_utf8(b).ok())
      .unwrap_or("")
      .to_string()
  } else {
    String::new()
  };

  Some(EquitiesQuote {
    symbol,
    quote_type,
    price,
    size,
    timestamp,
    subprovider,
    market_center,
    condition,
  })
}

fn decode_trade(msg: &[u8]) -> Option<EquitiesTrade> {
  if msg.len() < 3 {
    return None;
  }
  let symbol_length = msg[2] as usize;
  let symbol_end = 3 + symbol_length;
  if msg.len() < symbol_end + 23 {
    return None;
  }
  let symbol = std::str::from_utf8(&msg[3..symbol_end]).ok()?.to_string();
  let subprovider = Subprovider::from(msg[symbol_end]);
  let market_center = decode_utf16_market_center(&msg[symbol_end + 1..symbol_end + 3]);

  let price = f32::from_le_bytes(msg[symbol_end + 3..symbol_end + 7].try_into().ok()?);
  let size = u32::from_le_bytes(msg[symbol_end + 7..symbol_end + 11].try_into().ok()?);
  let timestamp = u64::from_le_bytes(msg[symbol_end + 11..symbol_end + 19].try_into().ok()?);
  let total_volume = u32::from_le_bytes(msg[symbol_end + 19..symbol_end + 23].try_into().ok()?);

  let condition_length_idx = symbol_end + 23;
  let condition_length = *msg.get(condition_length_idx)? as usize;
  let condition_start = condition_length_idx + 1;
  let condition = if condition_length > 0 {
    msg.get(condition_start..condition_start + condition_length)
      .and_then(|b| std::str::from_utf8(b).ok())
      .unwrap_or("")
      .to_string()
  } else {
    String::new()
  };

  Some(EquitiesTrade {
    symbol,
    price,
    size,
    total_volume,
    timestamp,
    subprovider,
    market_center,
    condition,
  })
}

fn decode_utf16_market_center(bytes: &[u8]) -> String {
  if bytes.len() < 2 {
    return String::new();
  }
  let unit = u16::from_le_bytes([bytes[0], bytes[1]]);
  String::from_utf16(&[unit]).unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn build_quote_message(symbol: &str, condition: &str) -> Vec<u8> {
    let mut msg = vec![1u8, 0u8, symbol.len() as u8];
    msg.extend_from_slice(symbol.as_bytes());
    msg.push(6); // subprovider: IEX
    msg.extend_from_slice(&1u16.to_le_bytes()); // market center utf-16 unit
    msg.extend_from_slice(&1.25f32.to_le_bytes());
    msg.extend_from_slice(&100u32.to_le_bytes());
    msg.extend_from_slice(&123456789u64.to_le_bytes());
    msg.push(condition.len() as u8);
    msg.extend_from_slice(condition.as_bytes());
    msg[1] = msg.len() as u8;
    msg
  }

  #[test]
  fn decodes_quote_group_of_one() {
    let message = build_quote_message("AAPL", "");
    let mut group = vec![1u8];
    group.extend_from_slice(&message);

    let mut events = Vec::new();
    EquitiesV2Decoder::new(false).decode_group(&group, &mut |e| events.push(e));

    assert_eq!(events.len(), 1);
    match &events[0] {
      RealtimeEvent::EquitiesQuote(q) => {
        assert_eq!(q.symbol, "AAPL");
        assert_eq!(q.quote_type, QuoteType::Ask);
        assert_eq!(q.size, 100);
        assert_eq!(q.subprovider, Subprovider::Iex);
      }
      other => panic!("unexpected event: {:?}", other),
    }
  }

  #[test]
  fn stops_on_truncated_trailing_message() {
    let mut group = vec![2u8];
    group.extend_from_slice(&build_quote_message("AAPL", ""));
    group.push(0); // second message's type byte, but nothing else follows

    let mut events = Vec::new();
    EquitiesV2Decoder::new(false).decode_group(&group, &mut |e| events.push(e));
    assert_eq!(events.len(), 1);
  }

  #[test]
  fn bypass_parsing_emits_raw_slice_without_trailing_byte() {
    let message = build_quote_message("AAPL", "");
    let mut group = vec![1u8];
    group.extend_from_slice(&message);

    let mut events = Vec::new();
    EquitiesV2Decoder::new(true).decode_group(&group, &mut |e| events.push(e));

    assert_eq!(events.len(), 1);
    match &events[0] {
      RealtimeEvent::EquitiesRaw(raw) => {
        assert_eq!(raw.len(), message.len() - 1);
        assert_eq!(&raw[..], &message[..message.len() - 1]);
      }
      other => panic!("unexpected event: {:?}", other),
    }
  }
}
