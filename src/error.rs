//! Error types for the `intrinio-realtime` crate.
//!
//! All fallible operations return [`Result<T>`], an alias for
//! `std::result::Result<T, IntrinioError>`. [`IntrinioError`] distinguishes
//! configuration errors (synchronous, fatal, surfaced at construction) from
//! everything else (recovered locally by the supervisor).

use crate::models::Channel;

/// All possible errors produced by this client.
#[derive(Debug, thiserror::Error)]
pub enum IntrinioError {
  /// Invalid or missing configuration, raised synchronously at construction.
  #[error("configuration error: {0}")]
  Configuration(String),

  /// The auth server rejected the request or returned an unexpected status.
  #[error("authentication failed ({status}): {body}")]
  Auth {
    /// The HTTP status code returned by the auth endpoint.
    status: reqwest::StatusCode,
    /// The response body text.
    body: String,
  },

  /// A network or transport-level error from `reqwest`.
  #[error("HTTP request failed: {0}")]
  Http(#[from] reqwest::Error),

  /// A WebSocket-level error.
  #[error("WebSocket error: {0}")]
  WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

  /// An error building or parsing a URL.
  #[error("URL error: {0}")]
  Url(#[from] url::ParseError),

  /// A wire message could not be decoded.
  #[error("decode error: {0}")]
  Decode(String),

  /// The staging queue overflowed and a message was dropped.
  #[error("staging queue overflow, dropping message for channel {0:?}")]
  QueueOverflow(Channel),

  /// A subscription operation was requested while not connected.
  #[error("not connected")]
  NotConnected,

  /// The client was asked to stop and is no longer accepting operations.
  #[error("client stopped")]
  Stopped,

  /// A user-supplied argument was invalid.
  #[error("invalid argument: {0}")]
  InvalidArgument(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, IntrinioError>;
