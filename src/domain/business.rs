//! Business points of interest and the document parse boundary.
//!
//! Business records originate in the remote document store and cross
//! into the process through [`Business::from_document`]. Malformed
//! records (missing required fields, wrong types, non-finite numbers)
//! are dropped there and never enter the registry.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::geo::Coordinate;

/// A point of interest with an attached offer.
///
/// Immutable once parsed; a business only leaves the registry when the
/// next snapshot replaces the whole registry.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Business {
    /// Stable external identifier (document id in the remote store).
    pub id: String,
    /// Display name, doubles as the offer notification title.
    pub name: String,
    /// Latitude in decimal degrees (finite).
    pub latitude: f64,
    /// Longitude in decimal degrees (finite).
    pub longitude: f64,
    /// Qualifying radius in meters (finite).
    pub radius_m: f64,
    /// Offer text, used as the notification body.
    pub offer_text: String,
    /// Optional logo URL attached to notifications.
    pub logo_url: Option<String>,
    /// Optional normalized offer expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Business {
    /// Parses a raw store document into a `Business`.
    ///
    /// Returns `None` when any of name, offerText, latitude, longitude
    /// or radius is missing or has the wrong type, or when a numeric
    /// field is non-finite. An unparseable expiry does not invalidate
    /// the record; it normalizes to `None`.
    #[must_use]
    pub fn from_document(id: &str, doc: &serde_json::Value) -> Option<Self> {
        let name = doc.get("name")?.as_str()?;
        let offer_text = doc.get("offerText")?.as_str()?;
        let latitude = doc.get("latitude")?.as_f64()?;
        let longitude = doc.get("longitude")?.as_f64()?;
        let radius_m = doc.get("radius")?.as_f64()?;

        if !latitude.is_finite() || !longitude.is_finite() || !radius_m.is_finite() {
            return None;
        }

        let logo_url = doc
            .get("logoUrl")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let expires_at = doc.get("expiryDate").and_then(normalize_expiry);

        Some(Self {
            id: id.to_string(),
            name: name.to_string(),
            latitude,
            longitude,
            radius_m,
            offer_text: offer_text.to_string(),
            logo_url,
            expires_at,
        })
    }

    /// The business's anchor coordinate.
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Radius used for platform geofence registration.
    ///
    /// Never smaller than `min_radius_m` so that tiny store-configured
    /// radii still produce a region the platform will fire on.
    #[must_use]
    pub fn geofence_radius_m(&self, min_radius_m: f64) -> f64 {
        self.radius_m.max(min_radius_m)
    }
}

/// Raw expiry representations found in store documents.
///
/// Documents written by different client versions carry the expiry as
/// an ISO-8601 string, an epoch number, or a remote-store timestamp
/// object. One decode step normalizes all of them to a canonical
/// `DateTime<Utc>`.
#[derive(Debug, Clone)]
enum RawExpiry {
    Iso(String),
    Epoch(f64),
    StoreTimestamp { seconds: i64, nanos: u32 },
}

fn classify_expiry(value: &serde_json::Value) -> Option<RawExpiry> {
    if let Some(s) = value.as_str() {
        return Some(RawExpiry::Iso(s.to_string()));
    }
    if let Some(n) = value.as_f64() {
        return Some(RawExpiry::Epoch(n));
    }
    if let Some(obj) = value.as_object() {
        let seconds = obj.get("seconds").and_then(serde_json::Value::as_i64)?;
        let nanos = obj
            .get("nanos")
            .and_then(serde_json::Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0);
        return Some(RawExpiry::StoreTimestamp { seconds, nanos });
    }
    None
}

/// Decodes any of the known expiry representations to UTC.
fn normalize_expiry(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match classify_expiry(value)? {
        RawExpiry::Iso(s) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        RawExpiry::Epoch(n) => {
            if !n.is_finite() {
                return None;
            }
            // Heuristic: values past the year ~5138 in seconds are
            // epoch milliseconds.
            let millis = if n.abs() >= 1e11 { n } else { n * 1000.0 };
            Utc.timestamp_millis_opt(millis as i64).single()
        }
        RawExpiry::StoreTimestamp { seconds, nanos } => {
            Utc.timestamp_opt(seconds, nanos).single()
        }
    }
}
