use std::time::{Duration, Instant};

/// Minimum time between token refreshes, regardless of provider.
pub const TOKEN_REFRESH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Holds the currently authorized token and when it was issued.
#[derive(Debug, Clone)]
pub struct Session {
  token: String,
  acquired_at: Instant,
}

impl Session {
  pub fn new(token: String) -> Self {
    Session {
      token,
      acquired_at: Instant::now(),
    }
  }

  pub fn token(&self) -> &str {
    &self.token
  }

  /// True once more than [`TOKEN_REFRESH_INTERVAL`] has elapsed since this
  /// session's token was acquired.
  pub fn is_stale(&self) -> bool {
    self.acquired_at.elapsed() >= TOKEN_REFRESH_INTERVAL
  }
}
