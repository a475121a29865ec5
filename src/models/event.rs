use bytes::Bytes;

use super::equities::{EquitiesQuote, EquitiesTrade};
use super::options::{
  OptionsQuote, OptionsRefresh, OptionsTrade, OptionsUnusualActivity,
};

/// A single decoded market event, as handed from the worker pool to user
/// callbacks alongside the current queue backlog depth.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
  EquitiesTrade(EquitiesTrade),
  EquitiesQuote(EquitiesQuote),
  OptionsTrade(OptionsTrade),
  OptionsQuote(OptionsQuote),
  OptionsRefresh(OptionsRefresh),
  OptionsUnusualActivity(OptionsUnusualActivity),
  /// One message's raw bytes (trailing byte excluded), emitted instead of a
  /// decoded trade/quote when `bypass_parsing` is set.
  EquitiesRaw(Bytes),
}
