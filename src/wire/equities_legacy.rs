use bytes::Bytes;

use super::GroupDecoder;
use crate::models::{EquitiesQuote, EquitiesTrade, QuoteType, RealtimeEvent, Subprovider};

/// Decoder for the legacy, pre-v2 equities format: fixed-width frames
/// keyed by a numeric instrument id rather than an ascii ticker symbol, and
/// carrying no subprovider, market center, or condition fields. Quote
/// frames are 18 bytes; trade frames are 22 bytes.
#[derive(Debug, Default)]
pub struct EquitiesLegacyDecoder {
  bypass_parsing: bool,
}

impl EquitiesLegacyDecoder {
  pub fn new(bypass_parsing: bool) -> Self {
    EquitiesLegacyDecoder { bypass_parsing }
  }
}

const QUOTE_SIZE: usize = 18;
const TRADE_SIZE: usize = 22;

impl GroupDecoder for EquitiesLegacyDecoder {
  fn decode_group(&self, bytes: &[u8], emit: &mut dyn FnMut(RealtimeEvent)) {
    let Some(&count) = bytes.first() else { return };
    let mut idx = 1usize;
    for _ in 0..count {
      if idx + 2 > bytes.len() {
        break;
      }
      let message_type = bytes[idx];
      let size = if message_type == 0 { TRADE_SIZE } else { QUOTE_SIZE };
      let end = idx + size;
      if end > bytes.len() {
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
  if msg.len() < QUOTE_SIZE {
    return None;
  }
  let quote_type = if msg[0] == 1 { QuoteType::Ask } else { QuoteType::Bid };
  let instrument_id = u32::from_le_bytes(msg[2..6].try_into().ok()?);
  let price = f32::from_le_bytes(msg[6..10].try_into().ok()?);
  let size = u32::from_le_bytes(msg[10..14].try_into().ok()?);
  let timestamp = u32::from_le_bytes(msg[14..18].try_into().ok()?) as u64;

  Some(EquitiesQuote {
    symbol: instrument_id.to_string(),
    quote_type,
    price,
    size,
    timestamp,
    subprovider: Subprovider::Iex,
    market_center: String::new(),
    condition: String::new(),
  })
}

fn decode_trade(msg: &[u8]) -> Option<EquitiesTrade> {
  if msg.len() < TRADE_SIZE {
    return None;
  }
  let instrument_id = u32::from_le_bytes(msg[2..6].try_into().ok()?);
  let price = f32::from_le_bytes(msg[6..10].try_into().ok()?);
  let size = u32::from_le_bytes(msg[10..14].try_into().ok()?);
  let timestamp = u32::from_le_bytes(msg[14..18].try_into().ok()?) as u64;
  let total_volume = u32::from_le_bytes(msg[18..22].try_into().ok()?);

  Some(EquitiesTrade {
    symbol: instrument_id.to_string(),
    price,
    size,
    total_volume,
    timestamp,
    subprovider: Subprovider::Iex,
    market_center: String::new(),
    condition: String::new(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decodes_fixed_width_quote_and_trade() {
    let mut quote = vec![1u8, QUOTE_SIZE as u8];
    quote.extend_from_slice(&42u32.to_le_bytes());
    quote.extend_from_slice(&9.5f32.to_le_bytes());
    quote.extend_from_slice(&10u32.to_le_bytes());
    quote.extend_from_slice(&100u32.to_le_bytes());
    assert_eq!(quote.len(), QUOTE_SIZE);

    let mut trade = vec![0u8, TRADE_SIZE as u8];
    trade.extend_from_slice(&42u32.to_le_bytes());
    trade.extend_from_slice(&9.5f32.to_le_bytes());
    trade.extend_from_slice(&10u32.to_le_bytes());
    trade.extend_from_slice(&100u32.to_le_bytes());
    trade.extend_from_slice(&500u32.to_le_bytes());
    assert_eq!(trade.len(), TRADE_SIZE);

    let mut group = vec![2u8];
    group.extend_from_slice(&trade);
    group.extend_from_slice(&quote);

    let mut events = Vec::new();
    EquitiesLegacyDecoder::new(false).decode_group(&group, &mut |e| events.push(e));
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], RealtimeEvent::EquitiesTrade(_)));
    assert!(matches!(events[1], RealtimeEvent::EquitiesQuote(_)));
  }

  #[test]
  fn bypass_parsing_emits_raw_slices_without_trailing_byte() {
    let mut trade = vec![0u8, TRADE_SIZE as u8];
    trade.extend_from_slice(&42u32.to_le_bytes());
    trade.extend_from_slice(&9.5f32.to_le_bytes());
    trade.extend_from_slice(&10u32.to_le_bytes());
    trade.extend_from_slice(&100u32.to_le_bytes());
    trade.extend_from_slice(&500u32.to_le_bytes());

    let mut group = vec![1u8];
    group.extend_from_slice(&trade);

    let mut events = Vec::new();
    EquitiesLegacyDecoder::new(true).decode_group(&group, &mut |e| events.push(e));
    assert_eq!(events.len(), 1);
    match &events[0] {
      RealtimeEvent::EquitiesRaw(raw) => {
        assert_eq!(&raw[..], &trade[..trade.len() - 1]);
      }
      other => panic!("unexpected event: {:?}", other),
    }
  }
}
