use std::fmt;

/// A subscription target: an equities symbol, an options contract (either
/// wire format), or the firehose wildcard.
///
/// Equities firehose is requested with the literal string `"lobby"`; options
/// firehose uses `"$FIREHOSE"`. Both are represented by [`Channel::Lobby`]
/// and translated to the right wire string by the caller that knows which
/// product family it is talking to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
  /// All symbols/contracts for the current subscription tier.
  Lobby,
  /// A single equities ticker symbol.
  Symbol(String),
  /// A single options contract, in whichever format the caller supplied.
  Contract(String),
}

impl Channel {
  pub fn symbol(s: impl Into<String>) -> Self {
    Channel::Symbol(s.into())
  }

  pub fn contract(s: impl Into<String>) -> Self {
    Channel::Contract(s.into())
  }

  pub fn is_lobby(&self) -> bool {
    matches!(self, Channel::Lobby)
  }

  /// The wire representation sent in a join/leave control frame. Both
  /// product families spell the firehose wildcard `"$FIREHOSE"` on the
  /// wire even though the user-facing name for equities is `"lobby"`.
  pub fn wire_name(&self, _is_options: bool) -> String {
    match self {
      Channel::Lobby => "$FIREHOSE".to_string(),
      Channel::Symbol(s) => s.clone(),
      Channel::Contract(s) => s.clone(),
    }
  }
}

impl fmt::Display for Channel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Channel::Lobby => write!(f, "lobby"),
      Channel::Symbol(s) => write!(f, "{}", s),
      Channel::Contract(s) => write!(f, "{}", s),
    }
  }
}

impl From<&str> for Channel {
  fn from(value: &str) -> Self {
    if value == "lobby" || value == "$FIREHOSE" {
      Channel::Lobby
    } else {
      Channel::Symbol(value.to_string())
    }
  }
}
