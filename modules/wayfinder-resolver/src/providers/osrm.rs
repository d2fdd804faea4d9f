use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use wayfinder_common::{LatLng, ResolverConfig, TravelMode};

use crate::traits::{RouteLeg, RouteProvider};

/// Routing backed by an OSRM `/route/v1` endpoint. OSRM has no transit profile.
pub struct OsrmRouter {
    client: reqwest::Client,
    base_url: String,
}

impl OsrmRouter {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(20))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        Self::new(&config.osrm_url, &config.user_agent)
    }

    fn route_url(&self, profile: &str, origin: LatLng, destination: LatLng) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}",
            self.base_url, profile, origin.lng, origin.lat, destination.lng, destination.lat
        )
    }
}

fn profile(mode: TravelMode) -> Option<&'static str> {
    match mode {
        TravelMode::Driving => Some("driving"),
        TravelMode::Walking => Some("foot"),
        TravelMode::Bicycling => Some("bike"),
        TravelMode::Transit => None,
    }
}

#[async_trait]
impl RouteProvider for OsrmRouter {
    async fn route(
        &self,
        origin: LatLng,
        destination: LatLng,
        mode: TravelMode,
    ) -> Result<RouteLeg> {
        let profile = profile(mode).ok_or_else(|| anyhow!("OSRM does not route {mode}"))?;
        let url = self.route_url(profile, origin, destination);

        let resp = self
            .client
            .get(&url)
            .query(&[("overview", "full"), ("geometries", "geojson")])
            .send()
            .await?;

        let status = resp.status();
        let body: OsrmResponse = resp
            .json()
            .await
            .with_context(|| format!("Failed to decode OSRM response (HTTP {})", status.as_u16()))?;
        debug!(%mode, code = body.code.as_str(), "OSRM route");

        body.into_leg()
    }

    fn supports(&self, mode: TravelMode) -> bool {
        profile(mode).is_some()
    }
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: OsrmGeometry,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    /// GeoJSON order: `[lng, lat]`.
    coordinates: Vec<[f64; 2]>,
}

impl OsrmResponse {
    fn into_leg(self) -> Result<RouteLeg> {
        if self.code != "Ok" {
            bail!(
                "OSRM {}: {}",
                self.code,
                self.message.unwrap_or_default()
            );
        }
        let Some(route) = self.routes.into_iter().next() else {
            bail!("OSRM returned no routes");
        };
        Ok(RouteLeg {
            distance_meters: route.distance,
            duration_seconds: route.duration,
            geometry: route
                .geometry
                .coordinates
                .into_iter()
                .map(|[lng, lat]| LatLng::new(lat, lng))
                .collect(),
        })
    }
}
