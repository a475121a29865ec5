use super::subprovider::Subprovider;

/// A national-best-bid-or-offer quote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteType {
  Ask,
  Bid,
}

/// A single equities quote update.
#[derive(Debug, Clone, PartialEq)]
pub struct EquitiesQuote {
  pub symbol: String,
  pub quote_type: QuoteType,
  pub price: f32,
  pub size: u32,
  /// Nanoseconds since epoch.
  pub timestamp: u64,
  pub subprovider: Subprovider,
  pub market_center: String,
  pub condition: String,
}

/// A single equities trade print.
#[derive(Debug, Clone, PartialEq)]
pub struct EquitiesTrade {
  pub symbol: String,
  pub price: f32,
  pub size: u32,
  pub total_volume: u32,
  /// Nanoseconds since epoch.
  pub timestamp: u64,
  pub subprovider: Subprovider,
  pub market_center: String,
  pub condition: String,
}

impl EquitiesTrade {
  /// Whether this print represents a dark-pool / off-exchange trade.
  ///
  /// The market centers that count as "dark" depend on the subprovider:
  /// SIP-derived feeds (CTA/UTP/OTC) treat an absent, `D`, `E`, NUL, or
  /// blank market center as dark; Nasdaq Basic treats `L`, `2`, NUL, or
  /// blank as dark. Every other subprovider never reports dark-pool prints.
  pub fn is_darkpool(&self) -> bool {
    let mc = self.market_center.trim();
    match self.subprovider {
      Subprovider::CtaA | Subprovider::CtaB | Subprovider::Otc | Subprovider::Utp => {
        mc.is_empty() || mc == "D" || mc == "E" || mc == "\0"
      }
      Subprovider::NasdaqBasic => {
        mc.is_empty() || mc == "L" || mc == "2" || mc == "\0"
      }
      _ => false,
    }
  }
}
