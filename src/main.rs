//! nearby-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use nearby_gateway::api;
use nearby_gateway::app_state::AppState;
use nearby_gateway::config::GatewayConfig;
use nearby_gateway::crypto::LocationCrypto;
use nearby_gateway::domain::{
    BusinessRegistry, ConversationRegistry, EventBus, PendingNotificationQueue, SuppressionCache,
};
use nearby_gateway::persistence::{KvStore, PostgresPersistence};
use nearby_gateway::service::{
    ConversationService, GeocodingClient, GeofencingBackend, LocationBackend,
    NoopLocationBackend, ProximityService,
};
use nearby_gateway::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting nearby-gateway");

    // Connect persistence, if enabled
    let store = if config.persistence_enabled {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;
        sqlx::migrate!().run(&pool).await?;
        Some(PostgresPersistence::new(pool))
    } else {
        tracing::info!("persistence disabled, running memory-only");
        None
    };

    let kv = Arc::new(match &store {
        Some(p) => KvStore::postgres(p.pool().clone()),
        None => KvStore::memory(),
    });

    // Build domain layer
    let registry = Arc::new(BusinessRegistry::new());
    let conversations_registry = Arc::new(ConversationRegistry::new());
    let suppression = Arc::new(SuppressionCache::new(
        Arc::clone(&kv),
        config.offer_cooldown_secs,
        config.visit_cooldown_secs,
    ));
    let event_bus = EventBus::new(config.event_bus_capacity);
    let pending = Arc::new(PendingNotificationQueue::new(config.pending_queue_capacity));

    let backend: Arc<dyn LocationBackend> = if config.geofencing_enabled {
        Arc::new(GeofencingBackend::new())
    } else {
        tracing::info!("geofencing disabled, installing no-op location backend");
        Arc::new(NoopLocationBackend::new())
    };

    let crypto = match &config.location_encryption_key {
        Some(key) => Some(LocationCrypto::from_base64(key)?),
        None => {
            tracing::warn!("no location encryption key set, visit locations stored in clear");
            None
        }
    };

    // Build service layer
    let proximity = Arc::new(ProximityService::new(
        registry,
        suppression,
        event_bus.clone(),
        Arc::clone(&pending),
        backend,
        store.clone(),
        kv,
        crypto,
        config.min_geofence_radius_m,
    ));
    proximity.hydrate().await;

    // Replay the mirrored business collection so the registry and
    // geofences survive a restart without waiting for the next sync.
    if let Some(store) = &store {
        match store.load_business_documents().await {
            Ok(documents) if !documents.is_empty() => {
                let documents = documents.into_iter().map(|d| (d.id, d.payload)).collect();
                let summary = proximity.sync_businesses(documents).await;
                tracing::info!(
                    accepted = summary.accepted,
                    dropped = summary.dropped,
                    "replayed mirrored business snapshot"
                );
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "business snapshot replay failed"),
        }
    }

    let conversations = Arc::new(ConversationService::new(
        conversations_registry,
        event_bus.clone(),
    ));

    let geocoding = config.geocoding_access_token.as_ref().map(|token| {
        Arc::new(GeocodingClient::new(
            config.geocoding_base_url.clone(),
            token.clone(),
        ))
    });
    if geocoding.is_none() {
        tracing::warn!("no geocoding access token set, geocoding endpoints will return 503");
    }

    // Build application state
    let app_state = AppState {
        proximity,
        conversations,
        geocoding,
        event_bus,
        pending,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
