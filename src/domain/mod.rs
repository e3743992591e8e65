//! Domain layer: geo math, business and conversation models, registries,
//! suppression caches, and the event system.
//!
//! This module contains the in-memory state the gateway operates on:
//! the business registry mirrored from the remote store, the session's
//! conversation list, the offer/visit cooldown caches, and the event
//! bus broadcasting every state change.

pub mod business;
pub mod business_registry;
pub mod conversation;
pub mod conversation_registry;
pub mod event;
pub mod event_bus;
pub mod geo;
pub mod pending_queue;
pub mod suppression;

pub use business::Business;
pub use business_registry::BusinessRegistry;
pub use conversation::{ChatMessage, Conversation, JoinRequest, JoinRequestStatus, UserProfile};
pub use conversation_registry::ConversationRegistry;
pub use event::GatewayEvent;
pub use event_bus::EventBus;
pub use geo::Coordinate;
pub use pending_queue::PendingNotificationQueue;
pub use suppression::SuppressionCache;
