//! Geocoding proxy endpoint DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::service::geocoding::Place;

/// `GET /places/search` query parameters.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct SearchParams {
    /// Free-text search query.
    pub q: String,
}

/// `GET /directions` query parameters.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct DirectionsParams {
    /// Origin latitude.
    pub from_lat: f64,
    /// Origin longitude.
    pub from_lon: f64,
    /// Destination latitude.
    pub to_lat: f64,
    /// Destination longitude.
    pub to_lon: f64,
}

/// `GET /places/search` response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SearchResponseDto {
    /// Matching places in upstream relevance order.
    pub results: Vec<Place>,
}
