//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events. The
//! `ready` command drains offer notifications that arrived while no
//! client was listening, so a cold-started client still receives the
//! tap-through payload that woke it.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::domain::{GatewayEvent, PendingNotificationQueue};

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<GatewayEvent>,
    pending: Arc<PendingNotificationQueue>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let responses = handle_text_message(&text, &mut subs, &pending).await;
                        let mut closed = false;
                        for resp_json in responses {
                            if ws_tx.send(Message::text(resp_json)).await.is_err() {
                                closed = true;
                                break;
                            }
                        }
                        if closed {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            // Event from EventBus
            event = event_rx.recv() => {
                match event {
                    Ok(gateway_event) => {
                        if subs.matches(gateway_event.channel_id()) {
                            let json = event_json(&gateway_event);
                            if ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Serializes a gateway event into an event-envelope JSON string.
fn event_json(event: &GatewayEvent) -> String {
    let msg = WsMessage {
        id: uuid::Uuid::new_v4().to_string(),
        msg_type: WsMessageType::Event,
        timestamp: chrono::Utc::now(),
        payload: serde_json::to_value(event).unwrap_or_default(),
    };
    serde_json::to_string(&msg).unwrap_or_default()
}

/// Handles a text message from the client, returning JSON frames to send.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    pending: &PendingNotificationQueue,
) -> Vec<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        let err = WsMessage {
            id: String::new(),
            msg_type: WsMessageType::Error,
            timestamp: chrono::Utc::now(),
            payload: serde_json::json!({
                "code": 400,
                "message": "malformed JSON"
            }),
        };
        return serde_json::to_string(&err).ok().into_iter().collect();
    };

    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload.clone()) else {
        let err = WsMessage {
            id: msg.id,
            msg_type: WsMessageType::Error,
            timestamp: chrono::Utc::now(),
            payload: serde_json::json!({
                "code": 404,
                "message": "unknown command"
            }),
        };
        return serde_json::to_string(&err).ok().into_iter().collect();
    };

    match command {
        WsCommand::Subscribe { channel_ids } => {
            subs.subscribe(&channel_ids);
            let response = WsMessage {
                id: msg.id,
                msg_type: WsMessageType::Response,
                timestamp: chrono::Utc::now(),
                payload: serde_json::json!({
                    "subscribed": channel_ids,
                    "count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            };
            serde_json::to_string(&response).ok().into_iter().collect()
        }
        WsCommand::Unsubscribe { channel_ids } => {
            subs.unsubscribe(&channel_ids);
            let response = WsMessage {
                id: msg.id,
                msg_type: WsMessageType::Response,
                timestamp: chrono::Utc::now(),
                payload: serde_json::json!({
                    "unsubscribed": channel_ids,
                    "remaining_count": subs.count(),
                }),
            };
            serde_json::to_string(&response).ok().into_iter().collect()
        }
        WsCommand::Ready => {
            let queued = pending.drain().await;
            let mut frames = Vec::with_capacity(queued.len() + 1);
            let response = WsMessage {
                id: msg.id,
                msg_type: WsMessageType::Response,
                timestamp: chrono::Utc::now(),
                payload: serde_json::json!({
                    "ready": true,
                    "queued_notifications": queued.len(),
                }),
            };
            if let Ok(json) = serde_json::to_string(&response) {
                frames.push(json);
            }
            for event in &queued {
                frames.push(event_json(event));
            }
            frames
        }
    }
}
