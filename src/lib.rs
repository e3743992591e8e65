//! # nearby-gateway
//!
//! REST API and WebSocket gateway for proximity-triggered business
//! offers and map-anchored conversations.
//!
//! The gateway keeps an in-memory registry of geofenced businesses,
//! runs a proximity pipeline over incoming location samples and
//! platform geofence callbacks (nearest-business selection, offer and
//! visit suppression windows, visit logging), and hosts a conversation
//! state machine (host-gated join requests, resolved display names,
//! silent no-ops for invalid transitions). Real-time delivery happens
//! over WebSocket with per-connection channel subscriptions.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── ProximityService, ConversationService (service/)
//!     ├── EventBus, PendingNotificationQueue (domain/)
//!     │
//!     ├── BusinessRegistry, ConversationRegistry (domain/)
//!     ├── SuppressionCache, LocationBackend
//!     │
//!     └── PostgreSQL Persistence (visits, document mirror, KV)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod crypto;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;
