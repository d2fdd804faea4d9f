// Test mocks for the map-action resolver.
//
// Three mocks matching the three provider seams:
// - MockPlaces (PlaceSearch): HashMap-based query→records, optional latency
// - MockRoutes (RouteProvider): per-mode measured legs, failures, unsupported modes, latency
// - MockLocator (DeviceLocator): fixed position, failure, or never answering
//
// Plus coordinates and place helpers for building scenarios.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use wayfinder_common::{LatLng, PlaceRecord, TravelMode};

use crate::traits::{DeviceLocator, PlaceSearch, RouteLeg, RouteProvider};

// ---------------------------------------------------------------------------
// Test constants
// ---------------------------------------------------------------------------

/// Boston, MA coordinates.
pub const BOSTON: (f64, f64) = (42.3601, -71.0589);
/// New York, NY coordinates.
pub const NYC: (f64, f64) = (40.7128, -74.0060);
/// Cambridge, MA coordinates.
pub const CAMBRIDGE: (f64, f64) = (42.3736, -71.1097);
/// Los Angeles, CA coordinates.
pub const LOS_ANGELES: (f64, f64) = (34.0522, -118.2437);

pub fn latlng((lat, lng): (f64, f64)) -> LatLng {
    LatLng::new(lat, lng)
}

/// A located place record with a stable id derived from its name.
pub fn place(name: &str, (lat, lng): (f64, f64)) -> PlaceRecord {
    let id = name.to_lowercase().replace(' ', "-");
    PlaceRecord::new(id, name, format!("{name}, United States")).with_location(lat, lng)
}

// ---------------------------------------------------------------------------
// MockPlaces
// ---------------------------------------------------------------------------

/// HashMap-based place search. Unregistered queries find nothing.
/// Builder pattern: `.on_search()`, `.on_place()`, `.failing()`, `.with_latency()`.
#[derive(Default)]
pub struct MockPlaces {
    results: HashMap<String, Vec<PlaceRecord>>,
    failures: HashSet<String>,
    latency: Duration,
    calls: Mutex<Vec<String>>,
}

impl MockPlaces {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_search(mut self, query: &str, records: Vec<PlaceRecord>) -> Self {
        self.results.insert(query.to_string(), records);
        self
    }

    pub fn on_place(self, query: &str, record: PlaceRecord) -> Self {
        self.on_search(query, vec![record])
    }

    pub fn failing(mut self, query: &str) -> Self {
        self.failures.insert(query.to_string());
        self
    }

    /// Every search sleeps this long before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queries that reached the provider, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlaceSearch for MockPlaces {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<PlaceRecord>> {
        self.calls.lock().unwrap().push(query.to_string());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.failures.contains(query) {
            bail!("MockPlaces: search failed for {query}");
        }
        let mut records = self.results.get(query).cloned().unwrap_or_default();
        records.truncate(limit);
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// MockRoutes
// ---------------------------------------------------------------------------

/// Per-mode route answers. Modes without a registered leg return `Err`.
/// Builder pattern: `.on_mode()`, `.on_leg()`, `.failing()`, `.unsupported()`,
/// `.with_latency()`.
#[derive(Default)]
pub struct MockRoutes {
    legs: HashMap<TravelMode, RouteLeg>,
    failures: HashSet<TravelMode>,
    unsupported: HashSet<TravelMode>,
    latency: Duration,
    calls: Mutex<Vec<TravelMode>>,
}

impl MockRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    /// A straight two-point leg with the given measurements.
    pub fn on_mode(mut self, mode: TravelMode, distance_km: f64, duration_minutes: f64) -> Self {
        self.legs.insert(
            mode,
            RouteLeg {
                distance_meters: distance_km * 1_000.0,
                duration_seconds: duration_minutes * 60.0,
                geometry: Vec::new(),
            },
        );
        self
    }

    pub fn on_leg(mut self, mode: TravelMode, leg: RouteLeg) -> Self {
        self.legs.insert(mode, leg);
        self
    }

    pub fn failing(mut self, mode: TravelMode) -> Self {
        self.failures.insert(mode);
        self
    }

    pub fn unsupported(mut self, mode: TravelMode) -> Self {
        self.unsupported.insert(mode);
        self
    }

    /// Every route request sleeps this long before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Modes that were requested, in call order.
    pub fn calls(&self) -> Vec<TravelMode> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RouteProvider for MockRoutes {
    async fn route(&self, origin: LatLng, destination: LatLng, mode: TravelMode) -> Result<RouteLeg> {
        self.calls.lock().unwrap().push(mode);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.failures.contains(&mode) {
            bail!("MockRoutes: {mode} failed");
        }
        let mut leg = self
            .legs
            .get(&mode)
            .cloned()
            .ok_or_else(|| anyhow!("MockRoutes: no {mode} route registered"))?;
        if leg.geometry.is_empty() {
            leg.geometry = vec![origin, destination];
        }
        Ok(leg)
    }

    fn supports(&self, mode: TravelMode) -> bool {
        !self.unsupported.contains(&mode)
    }
}

// ---------------------------------------------------------------------------
// MockLocator
// ---------------------------------------------------------------------------

pub enum MockLocator {
    At(LatLng),
    Failing,
    /// Never answers; exercises the location timeout.
    Hanging,
}

impl MockLocator {
    pub fn at(coords: (f64, f64)) -> Self {
        MockLocator::At(latlng(coords))
    }
}

#[async_trait]
impl DeviceLocator for MockLocator {
    async fn current_position(&self) -> Result<LatLng> {
        match self {
            MockLocator::At(position) => Ok(*position),
            MockLocator::Failing => bail!("MockLocator: permission denied"),
            MockLocator::Hanging => {
                std::future::pending::<()>().await;
                bail!("MockLocator: unreachable")
            }
        }
    }
}
