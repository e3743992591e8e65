//! Platform location/geofencing capability seam.
//!
//! The proximity pipeline never talks to a platform geofencing API
//! directly; it goes through [`LocationBackend`], injected at startup.
//! Restricted runtimes without background-task support get
//! [`NoopLocationBackend`], turning every registration into an inert
//! success instead of scattering capability checks through the
//! pipeline.

use std::fmt;
use std::sync::RwLock;

use crate::domain::Coordinate;
use crate::error::GatewayError;

/// A registered enter-only geofence region.
#[derive(Debug, Clone, PartialEq)]
pub struct Geofence {
    /// Region identifier: the business id.
    pub business_id: String,
    /// Region center.
    pub center: Coordinate,
    /// Region radius in meters (already floored to the configured
    /// minimum).
    pub radius_m: f64,
}

/// Strategy interface for platform geofence registration.
pub trait LocationBackend: Send + Sync + fmt::Debug {
    /// Whether the runtime actually supports background geofencing.
    fn is_supported(&self) -> bool;

    /// Replaces the full region set: clear all, then add the new set.
    /// Not a diff.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] when the platform rejects the
    /// registration; callers reduce this to a warning.
    fn replace_geofences(&self, fences: Vec<Geofence>) -> Result<(), GatewayError>;

    /// Currently registered regions.
    fn active_geofences(&self) -> Vec<Geofence>;
}

/// Bookkeeping backend for runtimes with geofencing support.
///
/// Tracks the active region set; actual platform delivery arrives back
/// through the `POST /geofence/enter` callback endpoint.
#[derive(Debug, Default)]
pub struct GeofencingBackend {
    regions: RwLock<Vec<Geofence>>,
}

impl GeofencingBackend {
    /// Creates a backend with no registered regions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocationBackend for GeofencingBackend {
    fn is_supported(&self) -> bool {
        true
    }

    fn replace_geofences(&self, fences: Vec<Geofence>) -> Result<(), GatewayError> {
        let mut regions = self
            .regions
            .write()
            .map_err(|_| GatewayError::Internal("geofence lock poisoned".to_string()))?;
        regions.clear();
        regions.extend(fences);
        Ok(())
    }

    fn active_geofences(&self) -> Vec<Geofence> {
        self.regions
            .read()
            .map(|regions| regions.clone())
            .unwrap_or_default()
    }
}

/// Inert backend for sandboxed/preview runtimes.
#[derive(Debug, Default)]
pub struct NoopLocationBackend;

impl NoopLocationBackend {
    /// Creates the no-op backend.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl LocationBackend for NoopLocationBackend {
    fn is_supported(&self) -> bool {
        false
    }

    fn replace_geofences(&self, _fences: Vec<Geofence>) -> Result<(), GatewayError> {
        Ok(())
    }

    fn active_geofences(&self) -> Vec<Geofence> {
        Vec::new()
    }
}
