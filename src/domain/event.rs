//! Domain events reflecting gateway state changes.
//!
//! Every mutation in the proximity pipeline and the conversation state
//! machine emits a [`GatewayEvent`] through the [`super::EventBus`].
//! Events are broadcast to WebSocket subscribers; offer notifications
//! additionally pass through the pending-notification queue when no
//! subscriber is connected.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::conversation::{ChatMessage, JoinRequest};

/// Event emitted after every observable state change.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GatewayEvent {
    /// A business snapshot was applied.
    BusinessesSynced {
        /// Businesses accepted into the registry.
        accepted: usize,
        /// Documents dropped at the parse boundary.
        dropped: usize,
        /// Whether platform geofences were re-registered.
        geofences_reregistered: bool,
        /// Snapshot timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The derived nearby-business state changed.
    NearbyChanged {
        /// Id of the business now nearby, or `None` when cleared.
        business_id: Option<String>,
        /// Chat channel derived from the nearby business.
        chat_channel_id: Option<String>,
        /// Change timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A proximity offer should be shown to the user.
    OfferNotification {
        /// Business the offer belongs to; deep-link target.
        business_id: String,
        /// Notification title (business name).
        title: String,
        /// Notification body (offer text).
        body: String,
        /// Optional logo attachment URL.
        logo_url: Option<String>,
        /// Trigger timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A visit record was written.
    VisitLogged {
        /// Visited business id.
        business_id: String,
        /// Acting user id.
        user_id: String,
        /// Distance from the user to the business in meters.
        distance_m: f64,
        /// Log timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A conversation was created.
    ConversationCreated {
        /// New conversation id.
        conversation_id: String,
        /// Conversation title.
        title: String,
        /// Hosting user id.
        host_id: String,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A message was appended to a conversation.
    MessageSent {
        /// Target conversation id.
        conversation_id: String,
        /// The appended message.
        message: ChatMessage,
        /// Append timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A join request was filed.
    JoinRequested {
        /// Target conversation id.
        conversation_id: String,
        /// The pending request.
        request: JoinRequest,
        /// Request timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A join request was approved or rejected.
    JoinRequestResolved {
        /// Target conversation id.
        conversation_id: String,
        /// The resolved request.
        request: JoinRequest,
        /// Resolution timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl GatewayEvent {
    /// The subscription channel this event belongs to.
    ///
    /// Conversation events map to their conversation id, proximity
    /// events to their business id. Registry-wide events have no
    /// channel and are only delivered to wildcard subscribers.
    #[must_use]
    pub fn channel_id(&self) -> Option<&str> {
        match self {
            Self::BusinessesSynced { .. } => None,
            Self::NearbyChanged { business_id, .. } => business_id.as_deref(),
            Self::OfferNotification { business_id, .. }
            | Self::VisitLogged { business_id, .. } => Some(business_id),
            Self::ConversationCreated {
                conversation_id, ..
            }
            | Self::MessageSent {
                conversation_id, ..
            }
            | Self::JoinRequested {
                conversation_id, ..
            }
            | Self::JoinRequestResolved {
                conversation_id, ..
            } => Some(conversation_id),
        }
    }

    /// The event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::BusinessesSynced { .. } => "businesses_synced",
            Self::NearbyChanged { .. } => "nearby_changed",
            Self::OfferNotification { .. } => "offer_notification",
            Self::VisitLogged { .. } => "visit_logged",
            Self::ConversationCreated { .. } => "conversation_created",
            Self::MessageSent { .. } => "message_sent",
            Self::JoinRequested { .. } => "join_requested",
            Self::JoinRequestResolved { .. } => "join_request_resolved",
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn offer_notification_channel_is_business_id() {
        let event = GatewayEvent::OfferNotification {
            business_id: "biz-1".to_string(),
            title: "Cafe".to_string(),
            body: "Free tea".to_string(),
            logo_url: None,
            timestamp: Utc::now(),
        };
        assert_eq!(event.channel_id(), Some("biz-1"));
        assert_eq!(event.event_type_str(), "offer_notification");
    }

    #[test]
    fn sync_event_has_no_channel() {
        let event = GatewayEvent::BusinessesSynced {
            accepted: 3,
            dropped: 1,
            geofences_reregistered: true,
            timestamp: Utc::now(),
        };
        assert_eq!(event.channel_id(), None);
    }

    #[test]
    fn events_serialize_with_snake_case_tags() {
        let event = GatewayEvent::NearbyChanged {
            business_id: Some("biz-1".to_string()),
            chat_channel_id: Some("biz-1".to_string()),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains("nearby_changed"));
        assert!(json.contains("biz-1"));
    }
}
