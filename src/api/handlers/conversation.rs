//! Conversation handlers: create, list, get, message, join flow.
//!
//! Mutations follow the state machine's silent-no-op contract: an
//! operation the reducer ignores (blank text, duplicate pending
//! request, already-resolved request) returns 200 with the unchanged
//! resource rather than an error. Only resource lookups return 404.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    ConversationListResponse, CreateConversationRequest, CreateConversationResponse,
    JoinRequestBody, RespondBody, SendMessageBody,
};
use crate::app_state::AppState;
use crate::domain::{Conversation, Coordinate};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /conversations` — Create a map-anchored conversation.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] on a non-finite anchor or
/// a blank host id.
#[utoipa::path(
    post,
    path = "/api/v1/conversations",
    tag = "Conversations",
    summary = "Create a conversation",
    description = "Creates a chat circle anchored at the given coordinate, hosted by the caller, seeded with a welcome message.",
    request_body = CreateConversationRequest,
    responses(
        (status = 201, description = "Conversation created", body = CreateConversationResponse),
        (status = 400, description = "Invalid anchor or host", body = ErrorResponse),
    )
)]
pub async fn create_conversation(
    State(state): State<AppState>,
    Json(req): Json<CreateConversationRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let coordinate = Coordinate::new(req.latitude, req.longitude);
    if !coordinate.is_finite() {
        return Err(GatewayError::InvalidRequest(
            "anchor latitude and longitude must be finite".to_string(),
        ));
    }
    if req.host.id.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "host id must not be blank".to_string(),
        ));
    }

    let conversation = state
        .conversations
        .create(&req.title, coordinate, &req.host)
        .await;

    let response = CreateConversationResponse {
        conversation_id: conversation.id.clone(),
        conversation,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /conversations` — List all live conversations.
#[utoipa::path(
    get,
    path = "/api/v1/conversations",
    tag = "Conversations",
    summary = "List conversations",
    description = "Returns every conversation of the current session in creation order.",
    responses(
        (status = 200, description = "Conversation list", body = ConversationListResponse),
    )
)]
pub async fn list_conversations(State(state): State<AppState>) -> impl IntoResponse {
    Json(ConversationListResponse {
        data: state.conversations.list().await,
    })
}

/// `GET /conversations/:id` — Get one conversation.
///
/// # Errors
///
/// Returns [`GatewayError::ConversationNotFound`] for unknown ids.
#[utoipa::path(
    get,
    path = "/api/v1/conversations/{id}",
    tag = "Conversations",
    summary = "Get conversation details",
    description = "Returns the conversation with its participants, messages, and join requests.",
    params(
        ("id" = String, Path, description = "Conversation id"),
    ),
    responses(
        (status = 200, description = "Conversation details", body = Conversation),
        (status = 404, description = "Conversation not found", body = ErrorResponse),
    )
)]
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let conversation = state
        .conversations
        .get(&id)
        .await
        .ok_or(GatewayError::ConversationNotFound(id))?;
    Ok(Json(conversation))
}

/// `POST /conversations/:id/messages` — Append a message.
///
/// Blank text is a silent no-op. The sender is not required to be a
/// participant (faithful to the source state machine; see DESIGN.md).
///
/// # Errors
///
/// Returns [`GatewayError::ConversationNotFound`] for unknown ids.
#[utoipa::path(
    post,
    path = "/api/v1/conversations/{id}/messages",
    tag = "Conversations",
    summary = "Send a message",
    description = "Appends a message with the sender's resolved display name. Blank text is accepted and ignored.",
    params(
        ("id" = String, Path, description = "Conversation id"),
    ),
    request_body = SendMessageBody,
    responses(
        (status = 200, description = "Conversation after the append", body = Conversation),
        (status = 404, description = "Conversation not found", body = ErrorResponse),
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SendMessageBody>,
) -> Result<impl IntoResponse, GatewayError> {
    let _ = state
        .conversations
        .send_message(&id, &req.sender, &req.text)
        .await;
    conversation_snapshot(&state, id).await
}

/// `POST /conversations/:id/join-requests` — Request to join.
///
/// Duplicate pending requests and participant self-requests are silent
/// no-ops.
///
/// # Errors
///
/// Returns [`GatewayError::ConversationNotFound`] for unknown ids.
#[utoipa::path(
    post,
    path = "/api/v1/conversations/{id}/join-requests",
    tag = "Conversations",
    summary = "Request to join",
    description = "Files a pending join request unless the user is already a participant or already has a pending request.",
    params(
        ("id" = String, Path, description = "Conversation id"),
    ),
    request_body = JoinRequestBody,
    responses(
        (status = 200, description = "Conversation after the request", body = Conversation),
        (status = 404, description = "Conversation not found", body = ErrorResponse),
    )
)]
pub async fn request_to_join(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<JoinRequestBody>,
) -> Result<impl IntoResponse, GatewayError> {
    let _ = state.conversations.request_to_join(&id, &req.user).await;
    conversation_snapshot(&state, id).await
}

/// `POST /conversations/:id/join-requests/:request_id/respond` —
/// Approve or reject a pending request.
///
/// Responding to a missing or already-resolved request is a silent
/// no-op.
///
/// # Errors
///
/// Returns [`GatewayError::ConversationNotFound`] for unknown
/// conversation ids.
#[utoipa::path(
    post,
    path = "/api/v1/conversations/{id}/join-requests/{request_id}/respond",
    tag = "Conversations",
    summary = "Resolve a join request",
    description = "Approves (adds the requester to participants) or rejects a pending join request. Resolutions are terminal.",
    params(
        ("id" = String, Path, description = "Conversation id"),
        ("request_id" = String, Path, description = "Join request id"),
    ),
    request_body = RespondBody,
    responses(
        (status = 200, description = "Conversation after the resolution", body = Conversation),
        (status = 404, description = "Conversation not found", body = ErrorResponse),
    )
)]
pub async fn respond_to_join_request(
    State(state): State<AppState>,
    Path((id, request_id)): Path<(String, String)>,
    Json(req): Json<RespondBody>,
) -> Result<impl IntoResponse, GatewayError> {
    let _ = state
        .conversations
        .respond(&id, &request_id, req.approve)
        .await;
    conversation_snapshot(&state, id).await
}

/// Returns the conversation after a mutation, 404 when it never existed.
async fn conversation_snapshot(
    state: &AppState,
    id: String,
) -> Result<Json<Conversation>, GatewayError> {
    let conversation = state
        .conversations
        .get(&id)
        .await
        .ok_or(GatewayError::ConversationNotFound(id))?;
    Ok(Json(conversation))
}

/// Conversation routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/conversations",
            post(create_conversation).get(list_conversations),
        )
        .route("/conversations/{id}", get(get_conversation))
        .route("/conversations/{id}/messages", post(send_message))
        .route("/conversations/{id}/join-requests", post(request_to_join))
        .route(
            "/conversations/{id}/join-requests/{request_id}/respond",
            post(respond_to_join_request),
        )
}
