//! Service layer: business logic orchestration.
//!
//! [`ProximityService`] runs the offer pipeline, [`ConversationService`]
//! drives the chat state machine, [`GeocodingClient`] talks to the
//! geocoding upstream, and [`LocationBackend`] is the injected platform
//! geofencing capability.

pub mod conversations;
pub mod geocoding;
pub mod location_backend;
pub mod proximity;

pub use conversations::ConversationService;
pub use geocoding::GeocodingClient;
pub use location_backend::{GeofencingBackend, LocationBackend, NoopLocationBackend};
pub use proximity::{NearbyBusinessState, ProximityService, SyncSummary};
