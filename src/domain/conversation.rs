//! Conversation model: map-anchored chat circles.
//!
//! A conversation lives only in process memory for the lifetime of the
//! session. It is anchored to a map coordinate, hosted by its creator,
//! and carries an append-only message log plus a queue of join
//! requests.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::geo::Coordinate;

/// Lifecycle of a single join request.
///
/// `Pending` is the only non-terminal state; a resolved request never
/// transitions again. A rejected user may file a fresh request later —
/// only *pending* duplicates are suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JoinRequestStatus {
    /// Awaiting a host decision.
    Pending,
    /// Approved by the host; the requester became a participant.
    Approved,
    /// Rejected by the host; participants unchanged.
    Rejected,
}

/// A user's request to join a conversation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JoinRequest {
    /// Request identifier.
    pub id: String,
    /// Requesting user id.
    pub user_id: String,
    /// Requesting user's display name at request time.
    pub user_name: String,
    /// When the request was filed.
    pub requested_at: DateTime<Utc>,
    /// Current state of the request.
    pub status: JoinRequestStatus,
}

/// A single chat message. Immutable once appended.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChatMessage {
    /// Message identifier.
    pub id: String,
    /// Sending user id, or `"system"` for seeded messages.
    pub sender_id: String,
    /// Sender display name resolved at send time.
    pub sender_name: String,
    /// Message body.
    pub text: String,
    /// Append timestamp; message order is insertion order.
    pub sent_at: DateTime<Utc>,
}

/// Identity fields used to resolve a display name.
#[derive(Debug, Clone, Default, serde::Deserialize, Serialize, ToSchema)]
pub struct UserProfile {
    /// Stable user id.
    pub id: String,
    /// Optional nickname; wins when non-blank.
    #[serde(default)]
    pub nickname: Option<String>,
    /// Optional given name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Optional family name.
    #[serde(default)]
    pub last_name: Option<String>,
}

impl UserProfile {
    /// Resolves the name shown next to messages and join requests.
    ///
    /// Non-blank nickname, else trimmed `"first last"`, else the
    /// `"Explorer"` fallback.
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(nick) = &self.nickname {
            let nick = nick.trim();
            if !nick.is_empty() {
                return nick.to_string();
            }
        }
        let first = self.first_name.as_deref().unwrap_or("").trim();
        let last = self.last_name.as_deref().unwrap_or("").trim();
        let full = format!("{first} {last}");
        let full = full.trim();
        if full.is_empty() {
            "Explorer".to_string()
        } else {
            full.to_string()
        }
    }
}

/// A map-anchored group chat held in memory for the session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Conversation {
    /// Conversation identifier, derived from creation time.
    pub id: String,
    /// Title; defaults to a coordinate-derived placeholder when blank.
    pub title: String,
    /// Map anchor.
    pub coordinate: Coordinate,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Host user id; always a participant.
    pub host_id: String,
    /// Host display name at creation time.
    pub host_name: String,
    /// Participant user ids, insertion-ordered, de-duplicated.
    pub participants: Vec<String>,
    /// Append-only message log.
    pub messages: Vec<ChatMessage>,
    /// Join requests in arrival order.
    pub join_requests: Vec<JoinRequest>,
}

impl Conversation {
    /// Returns `true` when `user_id` is a participant.
    #[must_use]
    pub fn is_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p == user_id)
    }

    /// Returns `true` when `user_id` already has a pending request.
    #[must_use]
    pub fn has_pending_request(&self, user_id: &str) -> bool {
        self.join_requests
            .iter()
            .any(|r| r.user_id == user_id && r.status == JoinRequestStatus::Pending)
    }
}

/// Placeholder title for conversations created with a blank title.
#[must_use]
pub fn placeholder_title(coordinate: Coordinate) -> String {
    format!(
        "Circle at {:.3}, {:.3}",
        coordinate.latitude, coordinate.longitude
    )
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn nickname_wins_when_non_blank() {
        let profile = UserProfile {
            id: "u1".to_string(),
            nickname: Some("Dana".to_string()),
            first_name: Some("Daniella".to_string()),
            last_name: Some("Levi".to_string()),
        };
        assert_eq!(profile.display_name(), "Dana");
    }

    #[test]
    fn blank_nickname_falls_back_to_full_name() {
        let profile = UserProfile {
            id: "u1".to_string(),
            nickname: Some("   ".to_string()),
            first_name: Some(" Daniella ".to_string()),
            last_name: Some("Levi".to_string()),
        };
        assert_eq!(profile.display_name(), "Daniella Levi");
    }

    #[test]
    fn partial_name_trims_cleanly() {
        let profile = UserProfile {
            id: "u1".to_string(),
            nickname: None,
            first_name: Some("Daniella".to_string()),
            last_name: None,
        };
        assert_eq!(profile.display_name(), "Daniella");
    }

    #[test]
    fn empty_profile_is_explorer() {
        let profile = UserProfile {
            id: "u1".to_string(),
            ..UserProfile::default()
        };
        assert_eq!(profile.display_name(), "Explorer");
    }

    #[test]
    fn placeholder_title_truncates_to_three_decimals() {
        let title = placeholder_title(Coordinate::new(1.0, 2.0));
        assert!(title.contains("1.000"));
        assert!(title.contains("2.000"));
    }
}
