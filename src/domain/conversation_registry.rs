//! In-memory conversation registry with reducer-style operations.
//!
//! Holds the session's conversation list behind a single `RwLock`.
//! Every operation is an atomic reducer; misuse (unknown conversation,
//! already-resolved request) is a silent no-op returning `None`, never
//! an error. Nothing is persisted: a process restart loses all
//! conversations.

use chrono::Utc;
use tokio::sync::RwLock;

use super::conversation::{
    ChatMessage, Conversation, JoinRequest, JoinRequestStatus, UserProfile, placeholder_title,
};
use super::geo::Coordinate;

/// Registry of all live conversations.
#[derive(Debug, Default)]
pub struct ConversationRegistry {
    conversations: RwLock<Vec<Conversation>>,
}

impl ConversationRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a conversation anchored at `coordinate`, hosted by `host`.
    ///
    /// A blank title defaults to a coordinate-derived placeholder. The
    /// conversation is seeded with one system-authored welcome message
    /// and the host as sole participant. Returns the new conversation.
    pub async fn create(
        &self,
        title: &str,
        coordinate: Coordinate,
        host: &UserProfile,
    ) -> Conversation {
        let now = Utc::now();
        let title = {
            let trimmed = title.trim();
            if trimmed.is_empty() {
                placeholder_title(coordinate)
            } else {
                trimmed.to_string()
            }
        };

        let mut conversations = self.conversations.write().await;

        // Ids derive from creation time; same-millisecond creations get
        // a numeric suffix so the id stays unique within the session.
        let base_id = now.timestamp_millis().to_string();
        let mut id = base_id.clone();
        let mut bump = 1u32;
        while conversations.iter().any(|c| c.id == id) {
            id = format!("{base_id}-{bump}");
            bump = bump.saturating_add(1);
        }

        let welcome = ChatMessage {
            id: uuid::Uuid::new_v4().to_string(),
            sender_id: "system".to_string(),
            sender_name: "System".to_string(),
            text: format!("Welcome to {title}! Say hello and invite explorers nearby."),
            sent_at: now,
        };

        let conversation = Conversation {
            id,
            title,
            coordinate,
            created_at: now,
            host_id: host.id.clone(),
            host_name: host.display_name(),
            participants: vec![host.id.clone()],
            messages: vec![welcome],
            join_requests: Vec::new(),
        };

        conversations.push(conversation.clone());
        conversation
    }

    /// Appends a message to a conversation.
    ///
    /// No-op (returns `None`) when the text trims to empty or the
    /// conversation does not exist. The sender is not required to be a
    /// participant.
    pub async fn send_message(
        &self,
        conversation_id: &str,
        sender: &UserProfile,
        text: &str,
    ) -> Option<ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let mut conversations = self.conversations.write().await;
        let conversation = conversations.iter_mut().find(|c| c.id == conversation_id)?;

        let message = ChatMessage {
            id: uuid::Uuid::new_v4().to_string(),
            sender_id: sender.id.clone(),
            sender_name: sender.display_name(),
            text: text.to_string(),
            sent_at: Utc::now(),
        };
        conversation.messages.push(message.clone());
        Some(message)
    }

    /// Files a join request for `user`.
    ///
    /// No-op when the user is already a participant or already has a
    /// pending request. Resolved (approved or rejected) history does
    /// not block a fresh request.
    pub async fn request_to_join(
        &self,
        conversation_id: &str,
        user: &UserProfile,
    ) -> Option<JoinRequest> {
        let mut conversations = self.conversations.write().await;
        let conversation = conversations.iter_mut().find(|c| c.id == conversation_id)?;

        if conversation.is_participant(&user.id) || conversation.has_pending_request(&user.id) {
            return None;
        }

        let request = JoinRequest {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            user_name: user.display_name(),
            requested_at: Utc::now(),
            status: JoinRequestStatus::Pending,
        };
        conversation.join_requests.push(request.clone());
        Some(request)
    }

    /// Resolves a pending join request.
    ///
    /// No-op unless the request exists and is still pending. Approval
    /// adds the requester to the participant list (de-duplicated);
    /// rejection only flips the status. Both outcomes are terminal.
    pub async fn respond(
        &self,
        conversation_id: &str,
        request_id: &str,
        approve: bool,
    ) -> Option<JoinRequest> {
        let mut conversations = self.conversations.write().await;
        let conversation = conversations.iter_mut().find(|c| c.id == conversation_id)?;

        let request = conversation
            .join_requests
            .iter_mut()
            .find(|r| r.id == request_id)?;
        if request.status != JoinRequestStatus::Pending {
            return None;
        }

        request.status = if approve {
            JoinRequestStatus::Approved
        } else {
            JoinRequestStatus::Rejected
        };
        let resolved = request.clone();

        if approve && !conversation.is_participant(&resolved.user_id) {
            conversation.participants.push(resolved.user_id.clone());
        }
        Some(resolved)
    }

    /// Looks up a conversation by id.
    pub async fn get(&self, conversation_id: &str) -> Option<Conversation> {
        self.conversations
            .read()
            .await
            .iter()
            .find(|c| c.id == conversation_id)
            .cloned()
    }

    /// Returns all conversations in creation order.
    pub async fn list(&self) -> Vec<Conversation> {
        self.conversations.read().await.clone()
    }

    /// Returns the number of live conversations.
    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }

    /// Returns `true` when no conversations exist.
    pub async fn is_empty(&self) -> bool {
        self.conversations.read().await.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn host() -> UserProfile {
        UserProfile {
            id: "h".to_string(),
            ..UserProfile::default()
        }
    }

    fn user(id: &str) -> UserProfile {
        UserProfile {
            id: id.to_string(),
            nickname: Some(format!("nick-{id}")),
            ..UserProfile::default()
        }
    }

    #[tokio::test]
    async fn create_with_blank_title_seeds_placeholder_and_welcome() {
        let registry = ConversationRegistry::new();
        let conversation = registry
            .create("", Coordinate::new(1.0, 2.0), &host())
            .await;

        assert!(conversation.title.contains("1.000"));
        assert!(conversation.title.contains("2.000"));
        assert_eq!(conversation.participants, vec!["h"]);
        assert_eq!(conversation.messages.len(), 1);
        assert_eq!(conversation.messages[0].sender_id, "system");
        assert!(conversation.join_requests.is_empty());
    }

    #[tokio::test]
    async fn create_keeps_explicit_title() {
        let registry = ConversationRegistry::new();
        let conversation = registry
            .create("  Beach walk  ", Coordinate::new(1.0, 2.0), &host())
            .await;
        assert_eq!(conversation.title, "Beach walk");
    }

    #[tokio::test]
    async fn same_millisecond_creations_get_distinct_ids() {
        let registry = ConversationRegistry::new();
        let mut ids = Vec::new();
        for _ in 0..5 {
            let c = registry.create("t", Coordinate::new(0.0, 0.0), &host()).await;
            ids.push(c.id);
        }
        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());
    }

    #[tokio::test]
    async fn send_message_appends_in_order() {
        let registry = ConversationRegistry::new();
        let c = registry.create("t", Coordinate::new(0.0, 0.0), &host()).await;

        let first = registry.send_message(&c.id, &user("u1"), "hello").await;
        let second = registry.send_message(&c.id, &user("u2"), "hi there").await;
        assert!(first.is_some());
        assert!(second.is_some());

        let Some(c) = registry.get(&c.id).await else {
            panic!("conversation disappeared");
        };
        // Welcome message plus the two appended ones, in order.
        assert_eq!(c.messages.len(), 3);
        assert_eq!(c.messages[1].text, "hello");
        assert_eq!(c.messages[1].sender_name, "nick-u1");
        assert_eq!(c.messages[2].text, "hi there");
    }

    #[tokio::test]
    async fn send_message_noops_on_blank_text_and_unknown_conversation() {
        let registry = ConversationRegistry::new();
        let c = registry.create("t", Coordinate::new(0.0, 0.0), &host()).await;

        assert!(registry.send_message(&c.id, &user("u1"), "   ").await.is_none());
        assert!(
            registry
                .send_message("no-such-id", &user("u1"), "hello")
                .await
                .is_none()
        );
        let Some(c) = registry.get(&c.id).await else {
            panic!("conversation disappeared");
        };
        assert_eq!(c.messages.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_pending_requests_are_suppressed() {
        let registry = ConversationRegistry::new();
        let c = registry.create("t", Coordinate::new(0.0, 0.0), &host()).await;

        assert!(registry.request_to_join(&c.id, &user("u1")).await.is_some());
        assert!(registry.request_to_join(&c.id, &user("u1")).await.is_none());

        let Some(c) = registry.get(&c.id).await else {
            panic!("conversation disappeared");
        };
        assert_eq!(c.join_requests.len(), 1);
    }

    #[tokio::test]
    async fn participants_cannot_request_to_join() {
        let registry = ConversationRegistry::new();
        let c = registry.create("t", Coordinate::new(0.0, 0.0), &host()).await;
        assert!(registry.request_to_join(&c.id, &host()).await.is_none());
    }

    #[tokio::test]
    async fn approve_adds_participant_and_is_terminal() {
        let registry = ConversationRegistry::new();
        let c = registry.create("t", Coordinate::new(0.0, 0.0), &host()).await;
        let Some(request) = registry.request_to_join(&c.id, &user("u1")).await else {
            panic!("expected a pending request");
        };

        let Some(resolved) = registry.respond(&c.id, &request.id, true).await else {
            panic!("expected approval to resolve");
        };
        assert_eq!(resolved.status, JoinRequestStatus::Approved);

        let Some(c2) = registry.get(&c.id).await else {
            panic!("conversation disappeared");
        };
        assert_eq!(c2.participants, vec!["h", "u1"]);

        // Responding again to the same (now resolved) request is a no-op.
        assert!(registry.respond(&c.id, &request.id, false).await.is_none());
        let Some(c3) = registry.get(&c.id).await else {
            panic!("conversation disappeared");
        };
        assert_eq!(c3.participants, vec!["h", "u1"]);
    }

    #[tokio::test]
    async fn reject_leaves_participants_and_allows_fresh_request() {
        let registry = ConversationRegistry::new();
        let c = registry.create("t", Coordinate::new(0.0, 0.0), &host()).await;
        let Some(request) = registry.request_to_join(&c.id, &user("u1")).await else {
            panic!("expected a pending request");
        };

        let Some(resolved) = registry.respond(&c.id, &request.id, false).await else {
            panic!("expected rejection to resolve");
        };
        assert_eq!(resolved.status, JoinRequestStatus::Rejected);

        let Some(c2) = registry.get(&c.id).await else {
            panic!("conversation disappeared");
        };
        assert_eq!(c2.participants, vec!["h"]);

        // Only pending duplicates are checked: a rejected user may ask again.
        assert!(registry.request_to_join(&c.id, &user("u1")).await.is_some());
    }

    #[tokio::test]
    async fn respond_on_unknown_request_is_noop() {
        let registry = ConversationRegistry::new();
        let c = registry.create("t", Coordinate::new(0.0, 0.0), &host()).await;
        assert!(registry.respond(&c.id, "missing", true).await.is_none());
        assert!(registry.respond("missing", "missing", true).await.is_none());
    }
}
