use super::options_exchange::OptionsExchange;

/// A parsed options contract identifier, always held internally in the
/// canonical 21-byte form (`SSSSSSYYMMDD[C|P]PPPPPPPP`: 6-char
/// underscore-padded symbol, 6-digit date, put/call flag, 5-digit whole
/// dollars + 3-digit fractional cents).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionsContract {
  canonical: String,
}

impl OptionsContract {
  /// Build from either the canonical or the alternate wire form.
  pub fn parse(contract: &str) -> Self {
    let canonical = to_canonical(contract);
    OptionsContract { canonical }
  }

  pub fn canonical(&self) -> &str {
    &self.canonical
  }

  pub fn alternate(&self) -> String {
    to_alternate(&self.canonical)
  }

  pub fn underlying_symbol(&self) -> &str {
    self.canonical[0..6].trim_end_matches('_')
  }

  /// The six-digit `YYMMDD` expiration string.
  pub fn expiration_date(&self) -> &str {
    &self.canonical[6..12]
  }

  pub fn is_call(&self) -> bool {
    self.canonical.as_bytes()[12] == b'C'
  }

  pub fn is_put(&self) -> bool {
    self.canonical.as_bytes()[12] == b'P'
  }

  pub fn strike_price(&self) -> f64 {
    let whole: f64 = self.canonical[13..18].parse().unwrap_or(0.0);
    let frac: f64 = self.canonical[18..21].parse().unwrap_or(0.0);
    whole + frac / 1000.0
  }
}

/// Convert a contract identifier (canonical or alternate) to the canonical
/// 21-byte form. Ported from the upstream SDK's
/// `_transform_contract_to_old`.
pub fn to_canonical(contract: &str) -> String {
  if contract.len() == 21 && contract.is_ascii() {
    return contract.to_string();
  }
  let bytes = contract.as_bytes();
  let mut template: Vec<u8> =
    b"______220101C00000000".to_vec();

  let underscore_index = match bytes.iter().position(|&b| b == b'_') {
    Some(i) => i,
    None => return contract.to_string(),
  };
  let decimal_index = match contract[9.min(contract.len())..].find('.') {
    Some(i) => i + 9.min(contract.len()),
    None => return contract.to_string(),
  };

  copy_into(&bytes[0..underscore_index], &mut template, 0);
  copy_into(&bytes[underscore_index + 1..underscore_index + 7], &mut template, 6);
  copy_into(&bytes[underscore_index + 7..underscore_index + 8], &mut template, 12);
  let whole_start = underscore_index + 8;
  let whole_dest = 18usize.saturating_sub(decimal_index - underscore_index - 8);
  copy_into(&bytes[whole_start..decimal_index], &mut template, whole_dest);
  copy_into(&bytes[decimal_index + 1..], &mut template, 18);

  String::from_utf8(template).unwrap_or_else(|_| contract.to_string())
}

fn copy_into(src: &[u8], dest: &mut [u8], dest_index: usize) {
  for (i, &b) in src.iter().enumerate() {
    if dest_index + i < dest.len() {
      dest[dest_index + i] = b;
    }
  }
}

/// Convert a canonical 21-byte contract identifier to the compact alternate
/// form (`SYMBOL_YYMMDD[C|P]WHOLE.FRAC`). Ported from the upstream SDK's
/// `_transform_contract_to_new`. Already-alternate or malformed input is
/// returned unchanged.
pub fn to_alternate(contract: &str) -> String {
  if contract.len() <= 9 || contract[0..9.min(contract.len())].find('.').is_some() {
    return contract.to_string();
  }
  if contract.len() < 21 {
    return contract.to_string();
  }
  let symbol = contract[0..6].trim_end_matches('_');
  let date = &contract[6..12];
  let call_put = &contract[12..13];
  let mut whole = contract[13..18].trim_start_matches('0').to_string();
  if whole.is_empty() {
    whole = "0".to_string();
  }
  let mut decimal = contract[18..21].to_string();
  if decimal.as_bytes()[2] == b'0' {
    decimal.truncate(2);
  }
  format!("{}_{}{}{}.{}", symbol, date, call_put, whole, decimal)
}

/// Price-scale byte that accompanies every scaled integer field on the wire.
/// 0-9 divide by `10^n`; `0x0A` divides by 512 (options tick-size
/// convention); `0x0F` always yields `0.0`; any other byte is treated as
/// scale 0.
pub fn scale_value(value: i64, scale_type: u8) -> f64 {
  match scale_type {
    0x00 => value as f64,
    0x01 => value as f64 / 10.0,
    0x02 => value as f64 / 100.0,
    0x03 => value as f64 / 1_000.0,
    0x04 => value as f64 / 10_000.0,
    0x05 => value as f64 / 100_000.0,
    0x06 => value as f64 / 1_000_000.0,
    0x07 => value as f64 / 10_000_000.0,
    0x08 => value as f64 / 100_000_000.0,
    0x09 => value as f64 / 1_000_000_000.0,
    0x0A => value as f64 / 512.0,
    0x0F => 0.0,
    _ => value as f64,
  }
}

/// Scale a wire `int32`, mapping the `i32::MIN`/`i32::MAX` sentinels to NaN.
pub fn scale_int32(value: i32, scale_type: u8) -> f64 {
  if value == i32::MAX || value == i32::MIN {
    f64::NAN
  } else {
    scale_value(value as i64, scale_type)
  }
}

/// Scale a wire `uint64`, mapping the `u64::MAX` sentinel to NaN.
pub fn scale_uint64(value: u64, scale_type: u8) -> f64 {
  if value == u64::MAX {
    f64::NAN
  } else {
    scale_value(value as i64, scale_type)
  }
}

/// Convert wire nanosecond ticks to a Unix timestamp in fractional seconds.
pub fn ticks_to_seconds(ticks: u64) -> f64 {
  ticks as f64 / 1_000_000_000.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OptionsUnusualActivitySentiment {
  Neutral = 0,
  Bullish = 1,
  Bearish = 2,
}

impl From<u8> for OptionsUnusualActivitySentiment {
  fn from(value: u8) -> Self {
    match value {
      1 => Self::Bullish,
      2 => Self::Bearish,
      _ => Self::Neutral,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OptionsUnusualActivityType {
  Block = 3,
  Sweep = 4,
  Large = 5,
  UnusualSweep = 6,
}

impl From<u8> for OptionsUnusualActivityType {
  fn from(value: u8) -> Self {
    match value {
      3 => Self::Block,
      4 => Self::Sweep,
      5 => Self::Large,
      _ => Self::UnusualSweep,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionsTrade {
  pub contract: OptionsContract,
  pub exchange: OptionsExchange,
  pub price: f64,
  pub size: u32,
  /// Unix seconds.
  pub timestamp: f64,
  pub total_volume: u64,
  pub qualifiers: [u8; 4],
  pub ask_price_at_execution: f64,
  pub bid_price_at_execution: f64,
  pub underlying_price_at_execution: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionsQuote {
  pub contract: OptionsContract,
  pub ask_price: f64,
  pub ask_size: u32,
  pub bid_price: f64,
  pub bid_size: u32,
  pub timestamp: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionsRefresh {
  pub contract: OptionsContract,
  pub open_interest: u32,
  pub open_price: f64,
  pub close_price: f64,
  pub high_price: f64,
  pub low_price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionsUnusualActivity {
  pub contract: OptionsContract,
  pub activity_type: OptionsUnusualActivityType,
  pub sentiment: OptionsUnusualActivitySentiment,
  pub total_value: f64,
  pub total_size: u32,
  pub average_price: f64,
  pub ask_price_at_execution: f64,
  pub bid_price_at_execution: f64,
  pub underlying_price_at_execution: f64,
  /// Unix seconds.
  pub timestamp: f64,
}
