//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::{EventBus, PendingNotificationQueue};
use crate::service::{ConversationService, GeocodingClient, ProximityService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Proximity offer pipeline.
    pub proximity: Arc<ProximityService>,
    /// Conversation state machine.
    pub conversations: Arc<ConversationService>,
    /// Geocoding upstream client; `None` when no token is configured.
    pub geocoding: Option<Arc<GeocodingClient>>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
    /// Offer notifications awaiting a ready subscriber.
    pub pending: Arc<PendingNotificationQueue>,
}
