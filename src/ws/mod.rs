//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` provides real-time delivery of
//! proximity, visit, and conversation events, filtered per connection
//! by channel subscription.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
