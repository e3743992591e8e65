//! Offer and visit cooldown suppression.
//!
//! Two independent id → last-event timestamp maps decide whether a
//! business may show another offer (30-minute window by default) or
//! log another visit (5 minutes). Both maps hydrate once from the KV
//! store and re-persist on every mark, so suppression decisions
//! survive a process restart.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::Mutex;

use crate::persistence::kv::KvStore;

const OFFER_KEY: &str = "suppression.offers";
const VISIT_KEY: &str = "suppression.visits";

/// Cooldown suppression cache for offers and visit logging.
///
/// Explicitly constructed and passed by reference (one instance per
/// process under normal operation, isolated instances in tests), never
/// a process global.
#[derive(Debug)]
pub struct SuppressionCache {
    offers: Mutex<HashMap<String, DateTime<Utc>>>,
    visits: Mutex<HashMap<String, DateTime<Utc>>>,
    offer_window: Duration,
    visit_window: Duration,
    store: Arc<KvStore>,
}

impl SuppressionCache {
    /// Creates an unhydrated cache over `store` with the given windows.
    #[must_use]
    pub fn new(store: Arc<KvStore>, offer_window_secs: i64, visit_window_secs: i64) -> Self {
        Self {
            offers: Mutex::new(HashMap::new()),
            visits: Mutex::new(HashMap::new()),
            offer_window: Duration::seconds(offer_window_secs),
            visit_window: Duration::seconds(visit_window_secs),
            store,
        }
    }

    /// Loads both maps from the KV store.
    ///
    /// Called once at startup. Missing or corrupt entries read as empty
    /// maps.
    pub async fn hydrate(&self) {
        *self.offers.lock().await = load_map(&self.store, OFFER_KEY).await;
        *self.visits.lock().await = load_map(&self.store, VISIT_KEY).await;
    }

    /// Whether `business_id` may show an offer at `now`.
    ///
    /// `false` while `now - last_shown <= offer_window`.
    pub async fn should_display_offer(&self, business_id: &str, now: DateTime<Utc>) -> bool {
        match self.offers.lock().await.get(business_id) {
            Some(last) => now - *last > self.offer_window,
            None => true,
        }
    }

    /// Records that `business_id` showed an offer at `now` and persists.
    pub async fn mark_offer_displayed(&self, business_id: &str, now: DateTime<Utc>) {
        let mut offers = self.offers.lock().await;
        offers.insert(business_id.to_string(), now);
        persist_map(&self.store, OFFER_KEY, &offers).await;
    }

    /// Whether a visit to `business_id` may be logged at `now`.
    ///
    /// `false` while `now - last_logged <= visit_window`.
    pub async fn should_log_visit(&self, business_id: &str, now: DateTime<Utc>) -> bool {
        match self.visits.lock().await.get(business_id) {
            Some(last) => now - *last > self.visit_window,
            None => true,
        }
    }

    /// Records that a visit to `business_id` was logged at `now` and persists.
    pub async fn mark_visit_logged(&self, business_id: &str, now: DateTime<Utc>) {
        let mut visits = self.visits.lock().await;
        visits.insert(business_id.to_string(), now);
        persist_map(&self.store, VISIT_KEY, &visits).await;
    }
}

/// Deserializes an id → epoch-millis map; anything corrupt reads as empty.
async fn load_map(store: &KvStore, key: &str) -> HashMap<String, DateTime<Utc>> {
    let Some(raw) = store.get(key).await else {
        return HashMap::new();
    };
    let Ok(millis) = serde_json::from_str::<HashMap<String, i64>>(&raw) else {
        tracing::warn!(key, "corrupt suppression payload, treating as empty");
        return HashMap::new();
    };
    millis
        .into_iter()
        .filter_map(|(id, ms)| Utc.timestamp_millis_opt(ms).single().map(|ts| (id, ts)))
        .collect()
}

async fn persist_map(store: &KvStore, key: &str, map: &HashMap<String, DateTime<Utc>>) {
    let millis: HashMap<&str, i64> = map
        .iter()
        .map(|(id, ts)| (id.as_str(), ts.timestamp_millis()))
        .collect();
    match serde_json::to_string(&millis) {
        Ok(raw) => store.put(key, &raw).await,
        Err(e) => tracing::warn!(key, error = %e, "suppression serialize failed"),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn cache() -> SuppressionCache {
        SuppressionCache::new(Arc::new(KvStore::memory()), 30 * 60, 5 * 60)
    }

    fn at(secs: i64) -> DateTime<Utc> {
        match Utc.timestamp_opt(1_700_000_000 + secs, 0).single() {
            Some(ts) => ts,
            None => panic!("valid timestamp"),
        }
    }

    #[tokio::test]
    async fn offer_window_suppresses_for_thirty_minutes() {
        let cache = cache();
        let t0 = at(0);
        assert!(cache.should_display_offer("biz", t0).await);

        cache.mark_offer_displayed("biz", t0).await;
        assert!(!cache.should_display_offer("biz", t0).await);
        assert!(!cache.should_display_offer("biz", at(15 * 60)).await);
        // Boundary: exactly 30 minutes is still suppressed.
        assert!(!cache.should_display_offer("biz", at(30 * 60)).await);
        assert!(cache.should_display_offer("biz", at(30 * 60 + 1)).await);
    }

    #[tokio::test]
    async fn visit_window_is_five_minutes_and_independent() {
        let cache = cache();
        let t0 = at(0);
        cache.mark_visit_logged("biz", t0).await;

        assert!(!cache.should_log_visit("biz", at(5 * 60)).await);
        assert!(cache.should_log_visit("biz", at(5 * 60 + 1)).await);
        // Marking a visit does not suppress offers.
        assert!(cache.should_display_offer("biz", t0).await);
    }

    #[tokio::test]
    async fn windows_are_per_business() {
        let cache = cache();
        cache.mark_offer_displayed("a", at(0)).await;
        assert!(!cache.should_display_offer("a", at(60)).await);
        assert!(cache.should_display_offer("b", at(60)).await);
    }

    #[tokio::test]
    async fn decisions_survive_rehydration() {
        let store = Arc::new(KvStore::memory());
        let first = SuppressionCache::new(Arc::clone(&store), 30 * 60, 5 * 60);
        first.mark_offer_displayed("biz", at(0)).await;
        first.mark_visit_logged("biz", at(0)).await;

        // A fresh cache over the same store makes identical decisions
        // after hydrating.
        let second = SuppressionCache::new(Arc::clone(&store), 30 * 60, 5 * 60);
        assert!(second.should_display_offer("biz", at(60)).await);
        second.hydrate().await;
        assert!(!second.should_display_offer("biz", at(60)).await);
        assert!(!second.should_log_visit("biz", at(60)).await);
        assert!(second.should_display_offer("biz", at(31 * 60)).await);
    }

    #[tokio::test]
    async fn corrupt_payload_reads_as_empty() {
        let store = Arc::new(KvStore::memory());
        store.put("suppression.offers", "{not json").await;
        let cache = SuppressionCache::new(Arc::clone(&store), 30 * 60, 5 * 60);
        cache.hydrate().await;
        assert!(cache.should_display_offer("biz", at(0)).await);
    }
}
