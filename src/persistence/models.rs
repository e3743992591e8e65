//! Database models for visits and business documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A stored visit row from the `visits` table.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VisitRecord {
    /// Auto-increment row ID.
    pub id: i64,
    /// Visited business id.
    pub business_id: String,
    /// Acting user id.
    pub user_id: String,
    /// Distance from the user to the business in meters.
    pub distance_m: f64,
    /// Optional location payload: cleartext JSON or an AES-GCM
    /// envelope, per `location_encrypted`.
    pub location: Option<String>,
    /// Whether `location` is encrypted.
    pub location_encrypted: bool,
    /// Server-side creation timestamp.
    pub visited_at: DateTime<Utc>,
}

/// A mirrored business document row from the `business_documents` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredBusinessDocument {
    /// Remote document id (primary key).
    pub id: String,
    /// Raw document payload as JSONB.
    pub payload: serde_json::Value,
    /// Last mirror timestamp.
    pub updated_at: DateTime<Utc>,
}
