//! Geographic primitives: coordinates and great-circle distance.
//!
//! All distance math in the gateway goes through
//! [`haversine_distance_m`], using the conventional mean Earth radius
//! of 6 371 000 m.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Mean Earth radius in meters used by the haversine formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS-84 coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinate {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate from latitude/longitude degrees.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns `true` if both components are finite numbers.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Great-circle distance between two coordinates in meters.
///
/// Haversine formula over a spherical Earth of radius
/// [`EARTH_RADIUS_M`]. Symmetric in its arguments; zero for identical
/// points.
#[must_use]
pub fn haversine_distance_m(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let p = Coordinate::new(32.0853, 34.7818);
        assert_eq!(haversine_distance_m(p, p), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinate::new(32.0853, 34.7818);
        let b = Coordinate::new(31.7683, 35.2137);
        let d_ab = haversine_distance_m(a, b);
        let d_ba = haversine_distance_m(b, a);
        assert!((d_ab - d_ba).abs() < 1e-9);
    }

    #[test]
    fn known_distance_tel_aviv_jerusalem() {
        // Tel Aviv <-> Jerusalem is roughly 54 km as the crow flies.
        let a = Coordinate::new(32.0853, 34.7818);
        let b = Coordinate::new(31.7683, 35.2137);
        let d = haversine_distance_m(a, b);
        assert!(d > 50_000.0 && d < 58_000.0, "got {d}");
    }

    #[test]
    fn small_displacement_is_small() {
        // ~0.001 degrees of latitude is about 111 m.
        let a = Coordinate::new(32.0, 34.0);
        let b = Coordinate::new(32.001, 34.0);
        let d = haversine_distance_m(a, b);
        assert!(d > 100.0 && d < 125.0, "got {d}");
    }

    #[test]
    fn non_finite_components_detected() {
        assert!(Coordinate::new(1.0, 2.0).is_finite());
        assert!(!Coordinate::new(f64::NAN, 2.0).is_finite());
        assert!(!Coordinate::new(1.0, f64::INFINITY).is_finite());
    }
}
