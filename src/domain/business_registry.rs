//! In-memory business registry with snapshot-replace semantics.
//!
//! [`BusinessRegistry`] mirrors the remote business collection. Each
//! store snapshot replaces the whole map; individual businesses are
//! never mutated in place. The registry also tracks the sorted list of
//! geofence ids so callers can detect when platform regions need to be
//! re-registered.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::business::Business;
use super::geo::{Coordinate, haversine_distance_m};

/// Result of a snapshot replacement.
#[derive(Debug, Clone)]
pub struct SnapshotOutcome {
    /// Sorted business ids after the replacement.
    pub geofence_ids: Vec<String>,
    /// `true` when the sorted id list differs from the previous one.
    pub geofences_changed: bool,
}

/// Central mirror of the remote business collection.
///
/// # Concurrency
///
/// A single `RwLock` guards the map: location ticks take read locks,
/// snapshot replacement takes the write lock. A business removed by a
/// concurrent snapshot simply stops qualifying on the next tick.
#[derive(Debug, Default)]
pub struct BusinessRegistry {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    businesses: HashMap<String, Business>,
    geofence_ids: Vec<String>,
}

impl BusinessRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the entire registry with a new snapshot.
    ///
    /// Returns the sorted geofence id list and whether it changed
    /// relative to the previous snapshot.
    pub async fn replace_all(&self, businesses: Vec<Business>) -> SnapshotOutcome {
        let mut ids: Vec<String> = businesses.iter().map(|b| b.id.clone()).collect();
        ids.sort();
        ids.dedup();

        let mut inner = self.inner.write().await;
        let changed = inner.geofence_ids != ids;
        inner.businesses = businesses.into_iter().map(|b| (b.id.clone(), b)).collect();
        inner.geofence_ids = ids.clone();

        SnapshotOutcome {
            geofence_ids: ids,
            geofences_changed: changed,
        }
    }

    /// Looks up a business by id.
    pub async fn get(&self, id: &str) -> Option<Business> {
        self.inner.read().await.businesses.get(id).cloned()
    }

    /// Returns all businesses, ordered by id.
    pub async fn list(&self) -> Vec<Business> {
        let inner = self.inner.read().await;
        let mut out: Vec<Business> = inner.businesses.values().cloned().collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// Selects the nearest business whose distance from `position` is
    /// within its own radius.
    ///
    /// Ties on distance break toward the lexicographically smallest id
    /// so selection is deterministic regardless of map iteration order.
    pub async fn nearest_within_radius(&self, position: Coordinate) -> Option<(Business, f64)> {
        let inner = self.inner.read().await;
        let mut best: Option<(&Business, f64)> = None;
        for business in inner.businesses.values() {
            let d = haversine_distance_m(position, business.coordinate());
            if d > business.radius_m {
                continue;
            }
            let better = match best {
                None => true,
                Some((current, best_d)) => {
                    d < best_d || (d == best_d && business.id < current.id)
                }
            };
            if better {
                best = Some((business, d));
            }
        }
        best.map(|(b, d)| (b.clone(), d))
    }

    /// Returns the number of registered businesses.
    pub async fn len(&self) -> usize {
        self.inner.read().await.businesses.len()
    }

    /// Returns `true` when the registry holds no businesses.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.businesses.is_empty()
    }
}
