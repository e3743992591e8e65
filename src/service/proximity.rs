//! Proximity offer pipeline: snapshot sync, location ticks, geofence
//! entries, and the shared entry-processing routine.
//!
//! Orchestration layer: acquire state, mutate, emit events, return.
//! Every external call inside the pipeline
//! (geofence registration, store reads/writes) is individually caught
//! and reduced to a warning; a failing cycle is retried naturally by
//! the next location tick or snapshot.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use super::location_backend::{Geofence, LocationBackend};
use crate::crypto::LocationCrypto;
use crate::domain::business_registry::SnapshotOutcome;
use crate::domain::geo::haversine_distance_m;
use crate::domain::{
    Business, BusinessRegistry, Coordinate, EventBus, GatewayEvent, PendingNotificationQueue,
    SuppressionCache,
};
use crate::persistence::{KvStore, PostgresPersistence};

/// KV key mirroring the last seen acting user id.
const DEVICE_USER_KEY: &str = "device_user_id";

/// Derived, ephemeral nearby-business state.
///
/// At most one business is nearby at a time: the nearest one whose
/// distance is within its own radius. The chat channel id equals the
/// business id.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct NearbyBusinessState {
    /// The currently nearby business, if any.
    pub business: Option<Business>,
    /// Chat channel derived from the nearby business id.
    pub chat_channel_id: Option<String>,
    /// Distance to the nearby business in meters.
    pub distance_m: Option<f64>,
}

/// Result of applying a business snapshot.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SyncSummary {
    /// Documents accepted into the registry.
    pub accepted: usize,
    /// Documents dropped at the parse boundary.
    pub dropped: usize,
    /// Whether platform geofences were re-registered.
    pub geofences_reregistered: bool,
}

#[derive(Debug, Default)]
struct PipelineState {
    last_position: Option<Coordinate>,
    nearby_business_id: Option<String>,
    nearby_distance_m: Option<f64>,
    default_user_id: Option<String>,
}

/// Orchestrates the proximity offer pipeline.
pub struct ProximityService {
    registry: Arc<BusinessRegistry>,
    suppression: Arc<SuppressionCache>,
    event_bus: EventBus,
    pending: Arc<PendingNotificationQueue>,
    backend: Arc<dyn LocationBackend>,
    store: Option<PostgresPersistence>,
    kv: Arc<KvStore>,
    crypto: Option<LocationCrypto>,
    min_geofence_radius_m: f64,
    state: RwLock<PipelineState>,
}

impl std::fmt::Debug for ProximityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProximityService")
            .field("backend_supported", &self.backend.is_supported())
            .field("persistence", &self.store.is_some())
            .field("encryption", &self.crypto.is_some())
            .finish_non_exhaustive()
    }
}

impl ProximityService {
    /// Creates a new `ProximityService`.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<BusinessRegistry>,
        suppression: Arc<SuppressionCache>,
        event_bus: EventBus,
        pending: Arc<PendingNotificationQueue>,
        backend: Arc<dyn LocationBackend>,
        store: Option<PostgresPersistence>,
        kv: Arc<KvStore>,
        crypto: Option<LocationCrypto>,
        min_geofence_radius_m: f64,
    ) -> Self {
        Self {
            registry,
            suppression,
            event_bus,
            pending,
            backend,
            store,
            kv,
            crypto,
            min_geofence_radius_m,
            state: RwLock::new(PipelineState::default()),
        }
    }

    /// Returns a reference to the business registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<BusinessRegistry> {
        &self.registry
    }

    /// Hydrates suppression caches and the device-user-id mirror from
    /// the KV store. Called once at startup.
    pub async fn hydrate(&self) {
        self.suppression.hydrate().await;
        if let Some(user_id) = self.kv.get(DEVICE_USER_KEY).await {
            self.state.write().await.default_user_id = Some(user_id);
        }
    }

    /// Applies a business-collection snapshot.
    ///
    /// Validates and parses every document, dropping invalid ones;
    /// replaces the in-memory registry; reconciles the document mirror
    /// (upsert kept ids, delete evicted ones, so a startup replay sees
    /// exactly the last snapshot); and re-registers platform geofences
    /// when the sorted id list changed. Store mirroring and geofence
    /// registration failures are warnings, never errors.
    pub async fn sync_businesses(&self, documents: Vec<(String, serde_json::Value)>) -> SyncSummary {
        let total = documents.len();
        let mut businesses = Vec::with_capacity(total);

        for (id, payload) in documents {
            match Business::from_document(&id, &payload) {
                Some(business) => {
                    if let Some(store) = &self.store
                        && let Err(e) = store.upsert_business_document(&id, &payload).await
                    {
                        tracing::warn!(business_id = %id, error = %e, "business mirror failed");
                    }
                    businesses.push(business);
                }
                None => {
                    tracing::debug!(business_id = %id, "dropping malformed business document");
                }
            }
        }

        if let Some(store) = &self.store {
            let keep: Vec<String> = businesses.iter().map(|b| b.id.clone()).collect();
            match store.prune_business_documents(&keep).await {
                Ok(pruned) if pruned > 0 => {
                    tracing::info!(pruned, "evicted stale mirrored business documents");
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "business mirror prune failed"),
            }
        }

        let accepted = businesses.len();
        let dropped = total - accepted;
        let outcome = self.registry.replace_all(businesses).await;
        let reregistered = self.register_geofences(&outcome).await;

        let _ = self.event_bus.publish(GatewayEvent::BusinessesSynced {
            accepted,
            dropped,
            geofences_reregistered: reregistered,
            timestamp: Utc::now(),
        });

        tracing::info!(accepted, dropped, reregistered, "business snapshot applied");
        SyncSummary {
            accepted,
            dropped,
            geofences_reregistered: reregistered,
        }
    }

    /// Re-registers platform geofences after a registry change.
    ///
    /// Full replace, not a diff: the backend clears all regions before
    /// adding the new set, each with radius floored to the configured
    /// minimum. Returns `true` only when a replacement actually ran and
    /// the backend accepted it.
    async fn register_geofences(&self, outcome: &SnapshotOutcome) -> bool {
        if !outcome.geofences_changed {
            return false;
        }

        let mut fences = Vec::with_capacity(outcome.geofence_ids.len());
        for id in &outcome.geofence_ids {
            if let Some(business) = self.registry.get(id).await {
                fences.push(Geofence {
                    business_id: business.id.clone(),
                    center: business.coordinate(),
                    radius_m: business.geofence_radius_m(self.min_geofence_radius_m),
                });
            }
        }

        match self.backend.replace_geofences(fences) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "geofence registration failed");
                false
            }
        }
    }

    /// Foreground location tick.
    ///
    /// Recomputes the nearest qualifying business and, when the
    /// selection changed, runs the shared entry-processing routine.
    /// Clears the nearby state when nothing qualifies.
    pub async fn handle_location_update(
        &self,
        position: Coordinate,
        user_id: Option<&str>,
    ) -> NearbyBusinessState {
        self.remember_user(user_id).await;
        self.state.write().await.last_position = Some(position);

        match self.registry.nearest_within_radius(position).await {
            Some((business, distance_m)) => {
                let entered = {
                    let mut state = self.state.write().await;
                    let entered = state.nearby_business_id.as_deref() != Some(business.id.as_str());
                    state.nearby_business_id = Some(business.id.clone());
                    state.nearby_distance_m = Some(distance_m);
                    entered
                };

                if entered {
                    let _ = self.event_bus.publish(GatewayEvent::NearbyChanged {
                        business_id: Some(business.id.clone()),
                        chat_channel_id: Some(business.id.clone()),
                        timestamp: Utc::now(),
                    });
                    self.process_business_entry(&business, user_id, distance_m, Some(position))
                        .await;
                }

                NearbyBusinessState {
                    chat_channel_id: Some(business.id.clone()),
                    business: Some(business),
                    distance_m: Some(distance_m),
                }
            }
            None => {
                let cleared = {
                    let mut state = self.state.write().await;
                    let cleared = state.nearby_business_id.take().is_some();
                    state.nearby_distance_m = None;
                    cleared
                };
                if cleared {
                    let _ = self.event_bus.publish(GatewayEvent::NearbyChanged {
                        business_id: None,
                        chat_channel_id: None,
                        timestamp: Utc::now(),
                    });
                }
                NearbyBusinessState::default()
            }
        }
    }

    /// Background region-enter callback.
    ///
    /// Resolves the business from the registry, falling back to a
    /// point-read of the mirrored document. Distance comes from the
    /// last known position, or the business's own radius when no
    /// position was ever seen. Unknown region ids are a warn + no-op.
    pub async fn handle_geofence_entry(&self, region_id: &str, user_id: Option<&str>) {
        self.remember_user(user_id).await;

        let business = match self.registry.get(region_id).await {
            Some(business) => Some(business),
            None => self.point_read_business(region_id).await,
        };
        let Some(business) = business else {
            tracing::warn!(region_id, "geofence entry for unknown business");
            return;
        };

        let last_position = self.state.read().await.last_position;
        let (distance_m, position) = match last_position {
            Some(position) => (
                haversine_distance_m(position, business.coordinate()),
                Some(position),
            ),
            None => (business.radius_m, None),
        };

        self.process_business_entry(&business, user_id, distance_m, position)
            .await;
    }

    /// Current derived nearby state.
    pub async fn nearby_state(&self) -> NearbyBusinessState {
        let (id, distance_m) = {
            let state = self.state.read().await;
            (state.nearby_business_id.clone(), state.nearby_distance_m)
        };
        match id {
            Some(id) => {
                let business = self.registry.get(&id).await;
                NearbyBusinessState {
                    chat_channel_id: business.as_ref().map(|b| b.id.clone()),
                    business,
                    distance_m,
                }
            }
            None => NearbyBusinessState::default(),
        }
    }

    /// Shared entry-processing routine.
    ///
    /// 1. Outside the 30-minute offer window, publish an offer
    ///    notification (parked in the pending queue when nobody is
    ///    connected) and mark offer-shown.
    /// 2. Resolve the acting user: parameter, else the mirrored device
    ///    user id.
    /// 3. Outside the 5-minute visit window, write a visit record
    ///    (location sealed when a key is configured) and mark
    ///    visit-logged.
    async fn process_business_entry(
        &self,
        business: &Business,
        user_id: Option<&str>,
        distance_m: f64,
        position: Option<Coordinate>,
    ) {
        let now = Utc::now();

        if self.suppression.should_display_offer(&business.id, now).await {
            let notification = GatewayEvent::OfferNotification {
                business_id: business.id.clone(),
                title: business.name.clone(),
                body: business.offer_text.clone(),
                logo_url: business.logo_url.clone(),
                timestamp: now,
            };
            if self.event_bus.receiver_count() == 0 {
                self.pending.push(notification.clone()).await;
            }
            let _ = self.event_bus.publish(notification);
            self.suppression.mark_offer_displayed(&business.id, now).await;
            tracing::info!(business_id = %business.id, "offer notification triggered");
        }

        let resolved_user = match user_id {
            Some(id) => Some(id.to_string()),
            None => self.state.read().await.default_user_id.clone(),
        };
        let Some(user) = resolved_user else {
            return;
        };

        if self.suppression.should_log_visit(&business.id, now).await {
            if self.log_visit(business, &user, distance_m, position).await {
                self.suppression.mark_visit_logged(&business.id, now).await;
                let _ = self.event_bus.publish(GatewayEvent::VisitLogged {
                    business_id: business.id.clone(),
                    user_id: user,
                    distance_m,
                    timestamp: now,
                });
            }
        }
    }

    /// Writes the visit record. Returns `false` when the write failed
    /// and the cooldown should stay open for the next cycle.
    async fn log_visit(
        &self,
        business: &Business,
        user_id: &str,
        distance_m: f64,
        position: Option<Coordinate>,
    ) -> bool {
        let Some(store) = &self.store else {
            // Memory-only mode: nothing to write, but the cooldown
            // still applies.
            return true;
        };

        let (location, encrypted) = match self.encode_location(position) {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(business_id = %business.id, error = %e, "location encode failed");
                (None, false)
            }
        };

        match store
            .save_visit(&business.id, user_id, distance_m, location.as_deref(), encrypted)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(business_id = %business.id, error = %e, "visit write failed");
                false
            }
        }
    }

    /// Serializes the optional location, sealing it when a key is set.
    fn encode_location(
        &self,
        position: Option<Coordinate>,
    ) -> Result<(Option<String>, bool), crate::error::GatewayError> {
        let Some(position) = position else {
            return Ok((None, false));
        };
        let clear = serde_json::to_string(&position)
            .map_err(|e| crate::error::GatewayError::Internal(e.to_string()))?;
        match &self.crypto {
            Some(crypto) => Ok((Some(crypto.encrypt(clear.as_bytes())?), true)),
            None => Ok((Some(clear), false)),
        }
    }

    /// Falls back to a point-read of the mirrored business document.
    async fn point_read_business(&self, id: &str) -> Option<Business> {
        let store = self.store.as_ref()?;
        match store.fetch_business_document(id).await {
            Ok(Some(doc)) => Business::from_document(&doc.id, &doc.payload),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(business_id = %id, error = %e, "business point-read failed");
                None
            }
        }
    }

    /// Recent visits to a business, newest first.
    ///
    /// Memory-only mode keeps no visit log and reads as empty.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::error::GatewayError::Persistence`] on
    /// database failure.
    pub async fn recent_visits(
        &self,
        business_id: &str,
        limit: i64,
    ) -> Result<Vec<crate::persistence::models::VisitRecord>, crate::error::GatewayError> {
        match &self.store {
            Some(store) => store.load_visits(business_id, limit).await,
            None => Ok(Vec::new()),
        }
    }

    /// Remembers the acting user and mirrors it to the KV store.
    async fn remember_user(&self, user_id: Option<&str>) {
        let Some(user_id) = user_id else {
            return;
        };
        let mut state = self.state.write().await;
        if state.default_user_id.as_deref() != Some(user_id) {
            state.default_user_id = Some(user_id.to_string());
            self.kv.put(DEVICE_USER_KEY, user_id).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::service::location_backend::{GeofencingBackend, NoopLocationBackend};
    use serde_json::json;

    fn business_doc(lat: f64, lon: f64, radius: f64) -> serde_json::Value {
        json!({
            "name": "Cafe Shalva",
            "offerText": "Free tea with any salad",
            "latitude": lat,
            "longitude": lon,
            "radius": radius,
        })
    }

    struct Fixture {
        service: ProximityService,
        backend: Arc<GeofencingBackend>,
        bus: EventBus,
        pending: Arc<PendingNotificationQueue>,
        kv: Arc<KvStore>,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(BusinessRegistry::new());
        let kv = Arc::new(KvStore::memory());
        let suppression = Arc::new(SuppressionCache::new(Arc::clone(&kv), 30 * 60, 5 * 60));
        let bus = EventBus::new(256);
        let pending = Arc::new(PendingNotificationQueue::new(16));
        let backend = Arc::new(GeofencingBackend::new());

        let service = ProximityService::new(
            registry,
            suppression,
            bus.clone(),
            Arc::clone(&pending),
            Arc::clone(&backend) as Arc<dyn LocationBackend>,
            None,
            Arc::clone(&kv),
            None,
            25.0,
        );
        Fixture {
            service,
            backend,
            bus,
            pending,
            kv,
        }
    }

    #[tokio::test]
    async fn sync_drops_invalid_documents_and_registers_geofences() {
        let f = fixture();
        let summary = f
            .service
            .sync_businesses(vec![
                ("good".to_string(), business_doc(32.0, 34.0, 5.0)),
                ("bad".to_string(), json!({ "name": "no coords" })),
            ])
            .await;

        assert_eq!(summary.accepted, 1);
        assert_eq!(summary.dropped, 1);
        assert!(summary.geofences_reregistered);

        let fences = f.backend.active_geofences();
        assert_eq!(fences.len(), 1);
        // Radius 5 m floored to the 25 m minimum.
        assert!(fences.iter().all(|g| g.radius_m == 25.0));
    }

    #[tokio::test]
    async fn second_snapshot_evicts_stale_businesses_everywhere() {
        let f = fixture();
        f.service
            .sync_businesses(vec![
                ("a".to_string(), business_doc(32.0, 34.0, 100.0)),
                ("b".to_string(), business_doc(33.0, 35.0, 100.0)),
            ])
            .await;
        f.service
            .sync_businesses(vec![("a".to_string(), business_doc(32.0, 34.0, 100.0))])
            .await;

        // Replaying the second snapshot (what a restart does from the
        // mirror) must not resurrect "b" anywhere.
        assert!(f.service.registry().get("b").await.is_none());
        let fences = f.backend.active_geofences();
        assert_eq!(fences.len(), 1);
        assert!(fences.iter().all(|g| g.business_id == "a"));

        // A stale platform region for "b" firing late must not produce
        // an offer.
        let mut rx = f.bus.subscribe();
        f.service.handle_geofence_entry("b", Some("u1")).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unchanged_id_set_skips_reregistration() {
        let f = fixture();
        f.service
            .sync_businesses(vec![("a".to_string(), business_doc(32.0, 34.0, 100.0))])
            .await;
        let summary = f
            .service
            .sync_businesses(vec![("a".to_string(), business_doc(32.0, 34.001, 100.0))])
            .await;
        assert!(!summary.geofences_reregistered);
    }

    #[tokio::test]
    async fn location_tick_selects_and_clears_nearby() {
        let f = fixture();
        f.service
            .sync_businesses(vec![("biz".to_string(), business_doc(32.0, 34.0, 200.0))])
            .await;

        let state = f
            .service
            .handle_location_update(Coordinate::new(32.0001, 34.0), Some("u1"))
            .await;
        assert_eq!(state.chat_channel_id.as_deref(), Some("biz"));
        assert!(state.distance_m.is_some());

        // Walking far away clears the state.
        let state = f
            .service
            .handle_location_update(Coordinate::new(33.0, 34.0), Some("u1"))
            .await;
        assert!(state.business.is_none());
        assert!(f.service.nearby_state().await.business.is_none());
    }

    #[tokio::test]
    async fn entry_triggers_offer_once_per_window() {
        let f = fixture();
        let mut rx = f.bus.subscribe();
        f.service
            .sync_businesses(vec![("biz".to_string(), business_doc(32.0, 34.0, 200.0))])
            .await;

        let inside = Coordinate::new(32.0001, 34.0);
        let outside = Coordinate::new(33.0, 34.0);
        f.service.handle_location_update(inside, Some("u1")).await;

        let mut offers = 0;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, GatewayEvent::OfferNotification { .. }) {
                offers += 1;
            }
        }
        assert_eq!(offers, 1);

        // Leave and re-enter inside the cooldown: no second offer.
        f.service.handle_location_update(outside, Some("u1")).await;
        f.service.handle_location_update(inside, Some("u1")).await;
        let mut offers = 0;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, GatewayEvent::OfferNotification { .. }) {
                offers += 1;
            }
        }
        assert_eq!(offers, 0);
    }

    #[tokio::test]
    async fn staying_nearby_does_not_retrigger() {
        let f = fixture();
        let mut rx = f.bus.subscribe();
        f.service
            .sync_businesses(vec![("biz".to_string(), business_doc(32.0, 34.0, 500.0))])
            .await;

        f.service
            .handle_location_update(Coordinate::new(32.0001, 34.0), Some("u1"))
            .await;
        f.service
            .handle_location_update(Coordinate::new(32.0002, 34.0), Some("u1"))
            .await;

        let mut nearby_changes = 0;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, GatewayEvent::NearbyChanged { .. }) {
                nearby_changes += 1;
            }
        }
        assert_eq!(nearby_changes, 1);
    }

    #[tokio::test]
    async fn offers_park_in_pending_queue_without_subscribers() {
        let f = fixture();
        f.service
            .sync_businesses(vec![("biz".to_string(), business_doc(32.0, 34.0, 200.0))])
            .await;

        // No bus receiver connected.
        f.service
            .handle_location_update(Coordinate::new(32.0001, 34.0), Some("u1"))
            .await;
        assert_eq!(f.pending.len().await, 1);

        let drained = f.pending.drain().await;
        assert!(matches!(
            drained.first(),
            Some(GatewayEvent::OfferNotification { .. })
        ));
    }

    #[tokio::test]
    async fn geofence_entry_uses_last_position_or_radius_fallback() {
        let f = fixture();
        let mut rx = f.bus.subscribe();
        f.service
            .sync_businesses(vec![("biz".to_string(), business_doc(32.0, 34.0, 120.0))])
            .await;

        // No position seen yet: distance falls back to the radius.
        f.service.handle_geofence_entry("biz", Some("u1")).await;
        let mut saw_offer = false;
        while let Ok(event) = rx.try_recv() {
            if let GatewayEvent::OfferNotification { business_id, .. } = event {
                assert_eq!(business_id, "biz");
                saw_offer = true;
            }
        }
        assert!(saw_offer);
    }

    #[tokio::test]
    async fn geofence_entry_for_unknown_region_is_noop() {
        let f = fixture();
        let mut rx = f.bus.subscribe();
        f.service.handle_geofence_entry("ghost", Some("u1")).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn user_id_is_mirrored_and_reused() {
        let f = fixture();
        f.service
            .sync_businesses(vec![("biz".to_string(), business_doc(32.0, 34.0, 200.0))])
            .await;

        // Tick with a user id mirrors it.
        f.service
            .handle_location_update(Coordinate::new(33.0, 34.0), Some("u1"))
            .await;
        assert_eq!(f.kv.get("device_user_id").await.as_deref(), Some("u1"));

        // A later anonymous geofence entry resolves the mirrored user
        // and still logs the visit (memory-only mode marks the window).
        let mut rx = f.bus.subscribe();
        f.service.handle_geofence_entry("biz", None).await;
        let mut saw_visit = false;
        while let Ok(event) = rx.try_recv() {
            if let GatewayEvent::VisitLogged { user_id, .. } = event {
                assert_eq!(user_id, "u1");
                saw_visit = true;
            }
        }
        assert!(saw_visit);
    }

    #[tokio::test]
    async fn noop_backend_reports_no_registration() {
        let registry = Arc::new(BusinessRegistry::new());
        let kv = Arc::new(KvStore::memory());
        let suppression = Arc::new(SuppressionCache::new(Arc::clone(&kv), 30 * 60, 5 * 60));
        let service = ProximityService::new(
            registry,
            suppression,
            EventBus::new(16),
            Arc::new(PendingNotificationQueue::new(4)),
            Arc::new(NoopLocationBackend::new()),
            None,
            kv,
            None,
            25.0,
        );

        let summary = service
            .sync_businesses(vec![("a".to_string(), business_doc(32.0, 34.0, 100.0))])
            .await;
        // The inert backend accepts the replace; the pipeline treats it
        // as registered so the id-diff logic stays identical.
        assert!(summary.geofences_reregistered);
    }
}
