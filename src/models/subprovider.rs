use serde_repr::{Deserialize_repr, Serialize_repr};

/// Originating feed behind an equities message. Unknown wire codes decode to
/// [`Subprovider::Iex`], matching the fallback the upstream SDK uses "for
/// backward behavior consistency".
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr,
)]
#[repr(u8)]
pub enum Subprovider {
  NoSubprovider = 0,
  CtaA = 1,
  CtaB = 2,
  Utp = 3,
  Otc = 4,
  NasdaqBasic = 5,
  Iex = 6,
  CboeOne = 7,
}

impl Default for Subprovider {
  fn default() -> Self {
    Subprovider::Iex
  }
}

impl From<u8> for Subprovider {
  fn from(value: u8) -> Self {
    match value {
      0 => Self::NoSubprovider,
      1 => Self::CtaA,
      2 => Self::CtaB,
      3 => Self::Utp,
      4 => Self::Otc,
      5 => Self::NasdaqBasic,
      6 => Self::Iex,
      7 => Self::CboeOne,
      _ => Self::Iex,
    }
  }
}

impl std::fmt::Display for Subprovider {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let s = match self {
      Subprovider::NoSubprovider => "NO_SUBPROVIDER",
      Subprovider::CtaA => "CTA_A",
      Subprovider::CtaB => "CTA_B",
      Subprovider::Utp => "UTP",
      Subprovider::Otc => "OTC",
      Subprovider::NasdaqBasic => "NASDAQ_BASIC",
      Subprovider::Iex => "IEX",
      Subprovider::CboeOne => "CBOE_ONE",
    };
    write!(f, "{}", s)
  }
}

/// Which upstream feed a client is authenticated against. Distinct providers
/// resolve to distinct auth/websocket hosts; see [`crate::auth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
  Realtime,
  DelayedSip,
  NasdaqBasic,
  CboeOne,
  Opra,
  Manual,
}

impl Provider {
  /// Which subproviders this provider can ever emit, used by the replay
  /// source to pick the per-subprovider tick files to merge.
  pub fn subproviders(&self) -> &'static [Subprovider] {
    match self {
      Provider::Realtime => &[Subprovider::Iex],
      Provider::DelayedSip => &[
        Subprovider::Utp,
        Subprovider::CtaA,
        Subprovider::CtaB,
        Subprovider::Otc,
      ],
      Provider::NasdaqBasic => &[Subprovider::NasdaqBasic],
      Provider::CboeOne => &[Subprovider::CboeOne],
      Provider::Opra | Provider::Manual => &[],
    }
  }
}
