//! Geocoding and directions upstream client.
//!
//! Thin `reqwest` wrapper over the hosted geocoding API: free-text
//! place search and point-to-point route computation. Both endpoints
//! require a bearer access token resolved from configuration and map
//! any non-success HTTP or response-level failure to
//! [`GatewayError::Upstream`].

use reqwest::Client;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Coordinate;
use crate::error::GatewayError;

/// A place returned by free-text search.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Place {
    /// Upstream place identifier.
    pub id: String,
    /// Human-readable place name.
    pub display_name: String,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Optional bounding box `[south, north, west, east]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<[f64; 4]>,
}

/// A computed route between two coordinates.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Route {
    /// Ordered coordinate path.
    pub path: Vec<Coordinate>,
    /// Total distance in meters.
    pub distance_m: f64,
    /// Total duration in seconds.
    pub duration_secs: f64,
}

/// Wire envelope for search responses.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Place>,
    #[serde(default)]
    error: Option<String>,
}

/// Wire envelope for directions responses.
#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    path: Vec<Coordinate>,
    #[serde(default)]
    distance_m: f64,
    #[serde(default)]
    duration_secs: f64,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the geocoding/directions upstream.
#[derive(Debug, Clone)]
pub struct GeocodingClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl GeocodingClient {
    /// Creates a client against `base_url` using `access_token`.
    #[must_use]
    pub fn new(base_url: String, access_token: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    /// Free-text place search.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Upstream`] on HTTP failure, non-success
    /// status, a response-level error code, or an undecodable body.
    pub async fn search_places(&self, query: &str) -> Result<Vec<Place>, GatewayError> {
        let url = format!("{}/v1/search", self.base_url);
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| GatewayError::Upstream(format!("search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Upstream(format!(
                "search returned status {status}"
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Upstream(format!("search decode failed: {e}")))?;
        if let Some(error) = body.error {
            return Err(GatewayError::Upstream(format!("search rejected: {error}")));
        }
        Ok(body.results)
    }

    /// Computes a route between two coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Upstream`] on HTTP failure, non-success
    /// status, a response-level error code, or an undecodable body.
    pub async fn route(&self, from: Coordinate, to: Coordinate) -> Result<Route, GatewayError> {
        let url = format!("{}/v1/directions", self.base_url);
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("from_lat", from.latitude),
                ("from_lon", from.longitude),
                ("to_lat", to.latitude),
                ("to_lon", to.longitude),
            ])
            .send()
            .await
            .map_err(|e| GatewayError::Upstream(format!("directions request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Upstream(format!(
                "directions returned status {status}"
            )));
        }

        let body: DirectionsResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Upstream(format!("directions decode failed: {e}")))?;
        if let Some(error) = body.error {
            return Err(GatewayError::Upstream(format!(
                "directions rejected: {error}"
            )));
        }
        Ok(Route {
            path: body.path,
            distance_m: body.distance_m,
            duration_secs: body.duration_secs,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn search_payload_decodes() {
        let raw = r#"{
            "results": [
                {
                    "id": "p1",
                    "display_name": "Gordon Beach",
                    "latitude": 32.083,
                    "longitude": 34.766,
                    "bounding_box": [32.08, 32.09, 34.76, 34.77]
                }
            ]
        }"#;
        let Ok(decoded) = serde_json::from_str::<SearchResponse>(raw) else {
            panic!("payload must decode");
        };
        assert_eq!(decoded.results.len(), 1);
        assert!(decoded.error.is_none());
        let Some(place) = decoded.results.first() else {
            panic!("expected one place");
        };
        assert_eq!(place.display_name, "Gordon Beach");
        assert!(place.bounding_box.is_some());
    }

    #[test]
    fn directions_payload_decodes_with_error_field() {
        let raw = r#"{ "error": "no route found" }"#;
        let Ok(decoded) = serde_json::from_str::<DirectionsResponse>(raw) else {
            panic!("payload must decode");
        };
        assert_eq!(decoded.error.as_deref(), Some("no route found"));
        assert!(decoded.path.is_empty());
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = GeocodingClient::new(
            "https://geocode.example.com/".to_string(),
            "token".to_string(),
        );
        assert_eq!(client.base_url, "https://geocode.example.com");
    }
}
