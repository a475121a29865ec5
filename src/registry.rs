//! Subscription registry: tracks the desired channel set against what has
//! actually been joined on the wire, and computes the diff to apply after
//! every (re)connect.

use std::collections::HashSet;

use crate::models::Channel;

#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
  desired: HashSet<Channel>,
  joined: HashSet<Channel>,
}

impl SubscriptionRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a channel to the desired set. Returns `true` if it wasn't already
  /// desired.
  pub fn join(&mut self, channel: Channel) -> bool {
    self.desired.insert(channel)
  }

  /// Remove a channel from the desired set. Returns `true` if it had been
  /// desired.
  pub fn leave(&mut self, channel: &Channel) -> bool {
    self.desired.remove(channel)
  }

  pub fn leave_all(&mut self) {
    self.desired.clear();
  }

  pub fn desired(&self) -> &HashSet<Channel> {
    &self.desired
  }

  /// Pure diff between desired and joined: `(to_join, to_leave)`. Does not
  /// mutate `joined` — callers apply the diff over the wire first and then
  /// call [`Self::mark_applied`].
  pub fn diff(&self) -> (Vec<Channel>, Vec<Channel>) {
    let to_join = self.desired.difference(&self.joined).cloned().collect();
    let to_leave = self.joined.difference(&self.desired).cloned().collect();
    (to_join, to_leave)
  }

  /// Record that the current desired set has been fully applied on the
  /// wire (called after every successful join/leave round, and always on a
  /// fresh reconnect before any new events are dispatched).
  pub fn mark_applied(&mut self) {
    self.joined = self.desired.clone();
  }

  /// Drop all record of what's joined, as happens when a connection drops —
  /// the next reconnect must resend the full desired set.
  pub fn reset_joined(&mut self) {
    self.joined.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn diff_reflects_pending_joins_and_leaves() {
    let mut reg = SubscriptionRegistry::new();
    reg.join(Channel::symbol("AAPL"));
    reg.join(Channel::symbol("MSFT"));
    reg.mark_applied();

    reg.leave(&Channel::symbol("AAPL"));
    reg.join(Channel::symbol("GOOG"));

    let (to_join, to_leave) = reg.diff();
    assert_eq!(to_join, vec![Channel::symbol("GOOG")]);
    assert_eq!(to_leave, vec![Channel::symbol("AAPL")]);
  }

  #[test]
  fn reconnect_resends_full_desired_set() {
    let mut reg = SubscriptionRegistry::new();
    reg.join(Channel::symbol("AAPL"));
    reg.mark_applied();

    reg.reset_joined();
    let (to_join, to_leave) = reg.diff();
    assert_eq!(to_join, vec![Channel::symbol("AAPL")]);
    assert!(to_leave.is_empty());
  }
}
