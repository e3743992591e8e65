//! Pending offer-notification queue.
//!
//! Offer notifications triggered while no WebSocket client is connected
//! would otherwise be dropped by the broadcast bus. They are parked
//! here instead, and drained in one step when a client signals
//! readiness (`ready` command on the WebSocket). Bounded: when full,
//! the oldest pending notification is evicted.

use std::collections::VecDeque;

use tokio::sync::Mutex;

use super::GatewayEvent;

/// Bounded FIFO queue of undelivered offer notifications.
#[derive(Debug)]
pub struct PendingNotificationQueue {
    queue: Mutex<VecDeque<GatewayEvent>>,
    capacity: usize,
}

impl PendingNotificationQueue {
    /// Creates an empty queue holding at most `capacity` notifications.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Parks a notification, evicting the oldest when full.
    pub async fn push(&self, event: GatewayEvent) {
        let mut queue = self.queue.lock().await;
        while queue.len() >= self.capacity {
            queue.pop_front();
        }
        queue.push_back(event);
    }

    /// Removes and returns all pending notifications in arrival order.
    pub async fn drain(&self) -> Vec<GatewayEvent> {
        self.queue.lock().await.drain(..).collect()
    }

    /// Returns the number of parked notifications.
    pub async fn len(&self) -> usize {
        self.queue.lock().await.len()
    }

    /// Returns `true` when nothing is parked.
    pub async fn is_empty(&self) -> bool {
        self.queue.lock().await.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn offer(id: &str) -> GatewayEvent {
        GatewayEvent::OfferNotification {
            business_id: id.to_string(),
            title: "t".to_string(),
            body: "b".to_string(),
            logo_url: None,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn drain_returns_in_arrival_order_and_empties() {
        let queue = PendingNotificationQueue::new(10);
        queue.push(offer("a")).await;
        queue.push(offer("b")).await;

        let drained = queue.drain().await;
        let ids: Vec<_> = drained.iter().filter_map(GatewayEvent::channel_id).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn full_queue_evicts_oldest() {
        let queue = PendingNotificationQueue::new(2);
        queue.push(offer("a")).await;
        queue.push(offer("b")).await;
        queue.push(offer("c")).await;

        let drained = queue.drain().await;
        let ids: Vec<_> = drained.iter().filter_map(GatewayEvent::channel_id).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }
}
