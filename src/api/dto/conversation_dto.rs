//! Conversation endpoint DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Conversation, UserProfile};

/// `POST /conversations` request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateConversationRequest {
    /// Conversation title; blank titles get a coordinate-derived
    /// placeholder.
    #[serde(default)]
    pub title: String,
    /// Anchor latitude in decimal degrees.
    pub latitude: f64,
    /// Anchor longitude in decimal degrees.
    pub longitude: f64,
    /// Hosting user.
    pub host: UserProfile,
}

/// `POST /conversations` response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreateConversationResponse {
    /// New conversation id.
    pub conversation_id: String,
    /// The created conversation.
    pub conversation: Conversation,
}

/// `POST /conversations/{id}/messages` request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SendMessageBody {
    /// Sending user.
    pub sender: UserProfile,
    /// Message text; blank text is a silent no-op.
    pub text: String,
}

/// `POST /conversations/{id}/join-requests` request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct JoinRequestBody {
    /// Requesting user.
    pub user: UserProfile,
}

/// `POST /conversations/{id}/join-requests/{request_id}/respond` request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RespondBody {
    /// `true` to approve, `false` to reject.
    pub approve: bool,
}

/// `GET /conversations` response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConversationListResponse {
    /// All live conversations in creation order.
    pub data: Vec<Conversation>,
}
