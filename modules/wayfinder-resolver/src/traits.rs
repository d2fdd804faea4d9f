// Provider seams for the map-action resolver.
//
// PlaceSearch: text query to place records (geocoding included).
// RouteProvider: one point-to-point route per travel mode.
// DeviceLocator: the user's current position, if the platform can tell.
//
// MockPlaces, MockRoutes and MockLocator in `testing` implement these for
// deterministic tests with no network.

use anyhow::Result;
use async_trait::async_trait;

use wayfinder_common::{LatLng, PlaceRecord, TravelMode};

// ---------------------------------------------------------------------------
// PlaceSearch
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PlaceSearch: Send + Sync {
    /// Up to `limit` records for `query`, best first. No match is `Ok(vec![])`.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<PlaceRecord>>;
}

// ---------------------------------------------------------------------------
// RouteProvider
// ---------------------------------------------------------------------------

/// One measured route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteLeg {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    /// Polyline from origin to destination.
    pub geometry: Vec<LatLng>,
}

#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn route(&self, origin: LatLng, destination: LatLng, mode: TravelMode)
        -> Result<RouteLeg>;

    /// Modes this provider can answer. Unsupported modes are never requested.
    fn supports(&self, mode: TravelMode) -> bool {
        let _ = mode;
        true
    }
}

// ---------------------------------------------------------------------------
// DeviceLocator
// ---------------------------------------------------------------------------

#[async_trait]
pub trait DeviceLocator: Send + Sync {
    async fn current_position(&self) -> Result<LatLng>;
}
