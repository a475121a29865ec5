//! Binary wire decoders.
//!
//! Every inbound WebSocket binary frame (after continuation-fragment
//! reassembly) is a *group*: a one-byte count followed by that many
//! back-to-back, self-delimited messages. Each product family
//! (equities v2, options, legacy equities) has its own message layout but
//! shares this group framing, so decoders are expressed behind one trait.

mod equities;
mod equities_legacy;
mod options;

pub use equities::EquitiesV2Decoder;
pub use equities_legacy::EquitiesLegacyDecoder;
pub use options::OptionsDecoder;

use crate::models::RealtimeEvent;

/// Decodes one group frame's worth of messages, invoking `emit` for each
/// successfully decoded event. A malformed trailing message (one whose
/// declared length runs past the end of the buffer) stops decoding of the
/// remaining messages in the group rather than panicking.
pub trait GroupDecoder: Send + Sync {
  fn decode_group(&self, bytes: &[u8], emit: &mut dyn FnMut(RealtimeEvent));
}
