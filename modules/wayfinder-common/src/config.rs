use std::env;
use std::str::FromStr;
use std::time::Duration;

use typed_builder::TypedBuilder;

use crate::error::ConfigError;
use crate::types::TravelMode;

/// Maximum accepted route length per travel mode, in kilometers.
#[derive(Debug, Clone, Copy, PartialEq, TypedBuilder)]
pub struct DistanceCaps {
    #[builder(default = 10_000.0)]
    pub driving_km: f64,
    #[builder(default = 600.0)]
    pub walking_km: f64,
    #[builder(default = 600.0)]
    pub bicycling_km: f64,
    #[builder(default = 20_000.0)]
    pub transit_km: f64,
}

impl DistanceCaps {
    pub fn cap_meters(&self, mode: TravelMode) -> f64 {
        let km = match mode {
            TravelMode::Driving => self.driving_km,
            TravelMode::Walking => self.walking_km,
            TravelMode::Bicycling => self.bicycling_km,
            TravelMode::Transit => self.transit_km,
        };
        km * 1_000.0
    }
}

impl Default for DistanceCaps {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Resolver and provider settings.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ResolverConfig {
    /// Pause between sequential searches in a multi-search.
    #[builder(default = Duration::from_millis(1_000))]
    pub search_delay: Duration,
    #[builder(default = Duration::from_secs(30 * 60))]
    pub cache_ttl: Duration,
    #[builder(default = Duration::from_millis(5_000))]
    pub location_timeout: Duration,
    #[builder(default)]
    pub distance_caps: DistanceCaps,
    #[builder(default = 15.0)]
    pub default_zoom: f64,
    #[builder(default = "https://nominatim.openstreetmap.org".to_string(), setter(into))]
    pub nominatim_url: String,
    #[builder(default = "https://router.project-osrm.org".to_string(), setter(into))]
    pub osrm_url: String,
    #[builder(default = "wayfinder/0.1".to_string(), setter(into))]
    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ResolverConfig {
    /// Load configuration from environment variables, falling back to defaults
    /// for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env` but reads values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let caps = defaults.distance_caps;

        Ok(Self {
            search_delay: Duration::from_millis(parse_or(
                &lookup,
                "WAYFINDER_SEARCH_DELAY_MS",
                defaults.search_delay.as_millis() as u64,
            )?),
            cache_ttl: Duration::from_secs(parse_or(
                &lookup,
                "WAYFINDER_CACHE_TTL_SECS",
                defaults.cache_ttl.as_secs(),
            )?),
            location_timeout: Duration::from_millis(parse_or(
                &lookup,
                "WAYFINDER_LOCATION_TIMEOUT_MS",
                defaults.location_timeout.as_millis() as u64,
            )?),
            distance_caps: DistanceCaps {
                driving_km: parse_or(&lookup, "WAYFINDER_MAX_DRIVING_KM", caps.driving_km)?,
                walking_km: parse_or(&lookup, "WAYFINDER_MAX_WALKING_KM", caps.walking_km)?,
                bicycling_km: parse_or(&lookup, "WAYFINDER_MAX_BICYCLING_KM", caps.bicycling_km)?,
                transit_km: parse_or(&lookup, "WAYFINDER_MAX_TRANSIT_KM", caps.transit_km)?,
            },
            default_zoom: parse_or(&lookup, "WAYFINDER_DEFAULT_ZOOM", defaults.default_zoom)?,
            nominatim_url: lookup("NOMINATIM_URL").unwrap_or(defaults.nominatim_url),
            osrm_url: lookup("OSRM_URL").unwrap_or(defaults.osrm_url),
            user_agent: lookup("WAYFINDER_USER_AGENT").unwrap_or(defaults.user_agent),
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
