use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use wayfinder_common::{
    Bounds, DirectionError, LatLng, MapAction, MapIntent, PlaceRecord, ResolverConfig,
};

use crate::cache::SearchCache;
use crate::channel::{Channel, ChannelRegistry, Ticket};
use crate::outcome::{ActionOutcome, MapEffect, MapState, Marker, Resolution, ResolveStatus};
use crate::traits::{DeviceLocator, PlaceSearch, RouteProvider};

/// Results requested per search. Every intent wants the single best place.
pub(crate) const SEARCH_LIMIT: usize = 1;

/// Zoom used before anything has moved the map.
const WORLD_ZOOM: f64 = 2.0;

/// A newer action took over the channel while this one was awaiting a provider.
#[derive(Debug)]
pub(crate) struct Stale;

pub(crate) type Step<T> = Result<T, Stale>;

/// Turns map actions into outcomes and map effects, one live action per channel.
///
/// Every `resolve` call takes a ticket from the channel registry. After each
/// provider await the ticket is re-checked, and an action whose ticket is no
/// longer current stops and reports `Superseded` without touching the map.
pub struct MapActionResolver {
    pub(crate) places: Arc<dyn PlaceSearch>,
    pub(crate) routes: Arc<dyn RouteProvider>,
    pub(crate) locator: Option<Arc<dyn DeviceLocator>>,
    pub(crate) config: ResolverConfig,
    cache: SearchCache,
    registry: Mutex<ChannelRegistry>,
    pub(crate) state: RwLock<MapState>,
}

impl MapActionResolver {
    pub fn new(
        places: Arc<dyn PlaceSearch>,
        routes: Arc<dyn RouteProvider>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            places,
            routes,
            locator: None,
            cache: SearchCache::new(config.cache_ttl),
            registry: Mutex::new(ChannelRegistry::default()),
            state: RwLock::new(MapState::new(LatLng::new(0.0, 0.0), WORLD_ZOOM)),
            config,
        }
    }

    pub fn with_locator(mut self, locator: Arc<dyn DeviceLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Starting viewport, e.g. the map's initial camera.
    pub fn with_viewport(self, center: LatLng, zoom: f64) -> Self {
        Self {
            state: RwLock::new(MapState::new(center, zoom)),
            ..self
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolves one action on `channel`. Never fails; provider errors become
    /// `ActionOutcome::ActionError`.
    pub async fn resolve(&self, channel: &Channel, action: MapAction) -> ResolveStatus {
        let action_id = action.id;
        let Some(ticket) = self.registry.lock().await.begin(channel, action_id) else {
            debug!(%channel, %action_id, "Ignoring duplicate action");
            return ResolveStatus::Duplicate { action_id };
        };

        info!(%channel, %action_id, kind = action.intent.kind(), "Resolving map action");

        let result = match action.intent {
            MapIntent::SearchOne { query } => self.search_one(&ticket, &query).await,
            MapIntent::SearchMany { queries } => self.search_many(&ticket, &queries).await,
            MapIntent::Goto {
                lat,
                lng,
                zoom,
                title,
            } => Ok(self.goto(LatLng::new(lat, lng), zoom, title)),
            MapIntent::Marker { lat, lng, title } => {
                Ok(self.marker(LatLng::new(lat, lng), title))
            }
            MapIntent::Directions {
                origin,
                destination,
            } => self.directions(&ticket, &origin, &destination).await,
        };

        let Ok((outcome, effects)) = result else {
            debug!(%channel, %action_id, "Action superseded mid-flight");
            return ResolveStatus::Superseded { action_id };
        };

        // Check and apply under the registry lock so no newer action can
        // start in between.
        let registry = self.registry.lock().await;
        if !registry.is_current(&ticket) {
            debug!(%channel, %action_id, "Action superseded before apply");
            return ResolveStatus::Superseded { action_id };
        }
        self.state.write().await.apply(channel, &effects);
        drop(registry);

        ResolveStatus::Applied(Resolution {
            action_id,
            outcome,
            effects,
        })
    }

    /// Clears the search cache and the map, and stales every in-flight action.
    pub async fn start_session(&self) {
        self.registry.lock().await.invalidate_all();
        self.cache.clear().await;
        let mut state = self.state.write().await;
        let viewport = state.viewport.clone();
        *state = MapState::new(viewport.center, viewport.zoom);
        info!("Started new map session");
    }

    pub async fn map_state(&self) -> MapState {
        self.state.read().await.clone()
    }

    /// Records a user pan/zoom so "my location" has a current fallback.
    pub async fn set_viewport(&self, center: LatLng, zoom: f64) {
        self.state
            .write()
            .await
            .apply(&Channel::default(), &[MapEffect::CenterOn { center, zoom }]);
    }

    /// Id of the newest action on `channel`.
    pub async fn current_action(&self, channel: &Channel) -> Option<uuid::Uuid> {
        self.registry.lock().await.current_action(channel)
    }

    pub(crate) async fn ensure_current(&self, ticket: &Ticket) -> Step<()> {
        if self.registry.lock().await.is_current(ticket) {
            Ok(())
        } else {
            Err(Stale)
        }
    }

    // --- Search ---

    /// Cached single-result search. `Ok(None)` when nothing matched.
    pub(crate) async fn lookup(&self, query: &str) -> anyhow::Result<Option<PlaceRecord>> {
        if let Some(records) = self.cache.get(query).await {
            debug!(query, "Search cache hit");
            return Ok(records.into_iter().next());
        }
        debug!(query, "Search cache miss");
        let records = self.places.search(query, SEARCH_LIMIT).await?;
        self.cache.insert(query, records.clone()).await;
        Ok(records.into_iter().next())
    }

    async fn is_cached(&self, query: &str) -> bool {
        self.cache.get(query).await.is_some()
    }

    async fn search_one(&self, ticket: &Ticket, query: &str) -> Step<(ActionOutcome, Vec<MapEffect>)> {
        let found = self.lookup(query).await;
        self.ensure_current(ticket).await?;

        let place = match found {
            Ok(place) => place,
            Err(e) => {
                warn!(query, error = %e, "Place search failed");
                let error = DirectionError::unknown(query, "", e);
                return Ok((ActionOutcome::ActionError(error), Vec::new()));
            }
        };

        let Some(place) = place else {
            debug!(query, "No place found");
            return Ok((ActionOutcome::PlacesFound(Vec::new()), Vec::new()));
        };

        let effects = match Marker::for_place(&place) {
            Some(marker) => vec![
                MapEffect::CenterOn {
                    center: marker.position,
                    zoom: self.config.default_zoom,
                },
                MapEffect::PlaceMarkers {
                    markers: vec![marker],
                },
            ],
            None => Vec::new(),
        };
        Ok((ActionOutcome::PlacesFound(vec![place]), effects))
    }

    async fn search_many(
        &self,
        ticket: &Ticket,
        queries: &[String],
    ) -> Step<(ActionOutcome, Vec<MapEffect>)> {
        let mut found = Vec::new();
        let mut called_provider = false;

        for query in queries {
            let cached = self.is_cached(query).await;
            if !cached && called_provider {
                tokio::time::sleep(self.config.search_delay).await;
                self.ensure_current(ticket).await?;
            }
            called_provider |= !cached;

            let result = self.lookup(query).await;
            self.ensure_current(ticket).await?;

            match result {
                Ok(Some(place)) => found.push(place),
                Ok(None) => debug!(query = query.as_str(), "No place found"),
                Err(e) => warn!(query = query.as_str(), error = %e, "Place search failed, skipping"),
            }
        }

        let markers: Vec<Marker> = found.iter().filter_map(Marker::for_place).collect();
        let mut effects = Vec::new();
        match markers.as_slice() {
            [] => {}
            [only] => effects.push(MapEffect::CenterOn {
                center: only.position,
                zoom: self.config.default_zoom,
            }),
            many => {
                if let Some(bounds) = Bounds::around(many.iter().map(|m| m.position)) {
                    effects.push(MapEffect::FitBounds { bounds });
                }
            }
        }
        if !markers.is_empty() {
            effects.push(MapEffect::PlaceMarkers { markers });
        }

        info!(queries = queries.len(), found = found.len(), "Multi-search finished");
        Ok((ActionOutcome::PlacesFound(found), effects))
    }

    // --- View ---

    fn goto(
        &self,
        center: LatLng,
        zoom: Option<f64>,
        title: Option<String>,
    ) -> (ActionOutcome, Vec<MapEffect>) {
        let mut effects = vec![MapEffect::CenterOn {
            center,
            zoom: zoom.unwrap_or(self.config.default_zoom),
        }];
        if title.is_some() {
            effects.push(MapEffect::PlaceMarkers {
                markers: vec![Marker::at(center, title)],
            });
        }
        (ActionOutcome::ViewUpdated, effects)
    }

    fn marker(&self, position: LatLng, title: Option<String>) -> (ActionOutcome, Vec<MapEffect>) {
        (
            ActionOutcome::ViewUpdated,
            vec![MapEffect::PlaceMarkers {
                markers: vec![Marker::at(position, title)],
            }],
        )
    }
}
