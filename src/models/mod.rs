mod channel;
mod equities;
mod event;
mod options;
mod options_exchange;
mod session;
mod subprovider;

pub use channel::Channel;
pub use equities::{EquitiesQuote, EquitiesTrade, QuoteType};
pub use event::RealtimeEvent;
pub use options::{
  scale_int32, scale_uint64, scale_value, ticks_to_seconds, to_alternate,
  to_canonical, OptionsContract, OptionsQuote, OptionsRefresh, OptionsTrade,
  OptionsUnusualActivity, OptionsUnusualActivitySentiment,
  OptionsUnusualActivityType,
};
pub use options_exchange::OptionsExchange;
pub use session::{Session, TOKEN_REFRESH_INTERVAL};
pub use subprovider::{Provider, Subprovider};
