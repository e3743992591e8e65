//! Location and geofence endpoint DTOs.

use serde::Deserialize;
use utoipa::ToSchema;

/// `POST /location` request: one foreground location sample.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LocationUpdateRequest {
    /// Sample latitude in decimal degrees.
    pub latitude: f64,
    /// Sample longitude in decimal degrees.
    pub longitude: f64,
    /// Acting user id, when known.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Horizontal accuracy in meters (informational).
    #[serde(default)]
    pub accuracy_m: Option<f64>,
    /// Heading in degrees (informational).
    #[serde(default)]
    pub heading_deg: Option<f64>,
}

/// `POST /geofence/enter` request: a platform region-enter callback.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GeofenceEnterRequest {
    /// Region identifier: the business id.
    pub region_id: String,
    /// Acting user id, when known.
    #[serde(default)]
    pub user_id: Option<String>,
}
