//! Per-connection subscription manager.
//!
//! Tracks which channel IDs a WebSocket client is subscribed to and
//! provides server-side event filtering. Channels are business ids and
//! conversation ids; events without a channel (registry snapshots)
//! reach wildcard subscribers only.

use std::collections::HashSet;

/// Manages the set of channel subscriptions for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed channel IDs. If `subscribe_all` is true, this set is ignored.
    channel_ids: HashSet<String>,
    /// Whether the client subscribes to all channels (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds channel IDs to the subscription set. `"*"` enables the wildcard.
    pub fn subscribe(&mut self, ids: &[String]) {
        for id in ids {
            if id == "*" {
                self.subscribe_all = true;
            } else {
                self.channel_ids.insert(id.clone());
            }
        }
    }

    /// Removes channel IDs from the subscription set.
    pub fn unsubscribe(&mut self, ids: &[String]) {
        for id in ids {
            if id == "*" {
                self.subscribe_all = false;
            } else {
                self.channel_ids.remove(id);
            }
        }
    }

    /// Returns `true` if an event on the given channel passes the filter.
    /// `None` marks a channel-less event, delivered to wildcard
    /// subscribers only.
    #[must_use]
    pub fn matches(&self, channel_id: Option<&str>) -> bool {
        if self.subscribe_all {
            return true;
        }
        channel_id.is_some_and(|id| self.channel_ids.contains(id))
    }

    /// Returns the number of explicitly subscribed channel IDs.
    #[must_use]
    pub fn count(&self) -> usize {
        self.channel_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn empty_matches_nothing() {
        let mgr = SubscriptionManager::new();
        assert!(!mgr.matches(Some("biz-1")));
        assert!(!mgr.matches(None));
    }

    #[test]
    fn subscribe_specific_channel() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&["biz-1".to_string()]);
        assert!(mgr.matches(Some("biz-1")));
        assert!(!mgr.matches(Some("biz-2")));
    }

    #[test]
    fn wildcard_matches_everything() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&["*".to_string()]);
        assert!(mgr.matches(Some("biz-1")));
        assert!(mgr.matches(None));
    }

    #[test]
    fn channelless_events_need_wildcard() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&["biz-1".to_string()]);
        assert!(!mgr.matches(None));
    }

    #[test]
    fn unsubscribe_removes_channel() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&["c1".to_string()]);
        assert!(mgr.matches(Some("c1")));
        mgr.unsubscribe(&["c1".to_string()]);
        assert!(!mgr.matches(Some("c1")));
    }

    #[test]
    fn unsubscribe_wildcard_disables_it() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&["*".to_string()]);
        mgr.unsubscribe(&["*".to_string()]);
        assert!(!mgr.matches(Some("c1")));
    }

    #[test]
    fn count_tracks_explicit() {
        let mut mgr = SubscriptionManager::new();
        assert_eq!(mgr.count(), 0);
        mgr.subscribe(&["a".to_string(), "b".to_string(), "*".to_string()]);
        assert_eq!(mgr.count(), 2);
        assert!(mgr.is_subscribed_all());
    }
}
