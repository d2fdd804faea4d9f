use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use wayfinder_common::{LatLng, PlaceRecord, ResolverConfig};

use crate::traits::PlaceSearch;

/// Longest query sent upstream.
const MAX_QUERY_LEN: usize = 200;

/// Place search backed by a Nominatim `/search` endpoint.
pub struct NominatimSearch {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimSearch {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        Self::new(&config.nominatim_url, &config.user_agent)
    }
}

#[async_trait]
impl PlaceSearch for NominatimSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<PlaceRecord>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() > MAX_QUERY_LEN {
            bail!("Search query too long (max {MAX_QUERY_LEN} chars)");
        }

        let limit = limit.max(1).to_string();
        let resp = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query), ("format", "jsonv2"), ("limit", limit.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            bail!("Nominatim returned {}: {}", status.as_u16(), message);
        }

        let results: Vec<NominatimPlace> = resp
            .json()
            .await
            .context("Failed to decode Nominatim response")?;
        debug!(query, results = results.len(), "Nominatim search");

        Ok(results.into_iter().map(NominatimPlace::into_record).collect())
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    place_id: u64,
    #[serde(default)]
    name: Option<String>,
    display_name: String,
    lat: String,
    lon: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl NominatimPlace {
    fn into_record(self) -> PlaceRecord {
        let short_name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .or_else(|| self.display_name.split(',').next().map(str::trim))
            .unwrap_or_default()
            .to_string();

        let location = match (self.lat.trim().parse(), self.lon.trim().parse()) {
            (Ok(lat), Ok(lng)) => Some(LatLng::new(lat, lng)),
            _ => None,
        };

        let mut record = PlaceRecord::new(self.place_id.to_string(), short_name, self.display_name);
        record.location = location;
        record.types = [self.category, self.kind].into_iter().flatten().collect();
        record
    }
}
