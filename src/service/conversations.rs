//! Conversation service: state-machine operations plus event emission.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    ChatMessage, Conversation, ConversationRegistry, Coordinate, EventBus, GatewayEvent,
    JoinRequest, UserProfile,
};

/// Orchestration layer for the conversation state machine.
///
/// Thin coordinator over [`ConversationRegistry`]: every successful
/// mutation publishes a [`GatewayEvent`]; registry no-ops emit nothing
/// and surface as `None`, mirroring the silent-no-op contract.
#[derive(Debug, Clone)]
pub struct ConversationService {
    registry: Arc<ConversationRegistry>,
    event_bus: EventBus,
}

impl ConversationService {
    /// Creates a new `ConversationService`.
    #[must_use]
    pub fn new(registry: Arc<ConversationRegistry>, event_bus: EventBus) -> Self {
        Self {
            registry,
            event_bus,
        }
    }

    /// Creates a map-anchored conversation and returns it.
    pub async fn create(
        &self,
        title: &str,
        coordinate: Coordinate,
        host: &UserProfile,
    ) -> Conversation {
        let conversation = self.registry.create(title, coordinate, host).await;

        let _ = self.event_bus.publish(GatewayEvent::ConversationCreated {
            conversation_id: conversation.id.clone(),
            title: conversation.title.clone(),
            host_id: conversation.host_id.clone(),
            timestamp: Utc::now(),
        });

        tracing::info!(conversation_id = %conversation.id, "conversation created");
        conversation
    }

    /// Appends a message; `None` on the registry's silent no-ops.
    pub async fn send_message(
        &self,
        conversation_id: &str,
        sender: &UserProfile,
        text: &str,
    ) -> Option<ChatMessage> {
        let message = self
            .registry
            .send_message(conversation_id, sender, text)
            .await?;

        let _ = self.event_bus.publish(GatewayEvent::MessageSent {
            conversation_id: conversation_id.to_string(),
            message: message.clone(),
            timestamp: Utc::now(),
        });
        Some(message)
    }

    /// Files a join request; `None` when suppressed as a duplicate or
    /// the user is already a participant.
    pub async fn request_to_join(
        &self,
        conversation_id: &str,
        user: &UserProfile,
    ) -> Option<JoinRequest> {
        let request = self.registry.request_to_join(conversation_id, user).await?;

        let _ = self.event_bus.publish(GatewayEvent::JoinRequested {
            conversation_id: conversation_id.to_string(),
            request: request.clone(),
            timestamp: Utc::now(),
        });
        Some(request)
    }

    /// Resolves a pending join request; `None` when the request is
    /// missing or already resolved.
    pub async fn respond(
        &self,
        conversation_id: &str,
        request_id: &str,
        approve: bool,
    ) -> Option<JoinRequest> {
        let request = self
            .registry
            .respond(conversation_id, request_id, approve)
            .await?;

        let _ = self.event_bus.publish(GatewayEvent::JoinRequestResolved {
            conversation_id: conversation_id.to_string(),
            request: request.clone(),
            timestamp: Utc::now(),
        });

        tracing::info!(
            conversation_id,
            request_id,
            approved = approve,
            "join request resolved"
        );
        Some(request)
    }

    /// Looks up a conversation by id.
    pub async fn get(&self, conversation_id: &str) -> Option<Conversation> {
        self.registry.get(conversation_id).await
    }

    /// Lists all conversations in creation order.
    pub async fn list(&self) -> Vec<Conversation> {
        self.registry.list().await
    }
}
