//! Directions: resolve both endpoints, route every supported mode at once,
//! then keep the modes that fit their distance caps.

use futures::future::join_all;
use tracing::{debug, info, warn};

use wayfinder_common::{
    Bounds, DirectionError, Endpoint, LatLng, PlaceRecord, RouteOption, RouteResult, TravelMode,
};

use crate::channel::Ticket;
use crate::outcome::{ActionOutcome, MapEffect, Marker};
use crate::resolver::{MapActionResolver, Step};
use crate::traits::RouteLeg;

/// Origin phrase answered by the device locator instead of search.
pub const MY_LOCATION: &str = "my location";

/// A directions endpoint with coordinates.
struct ResolvedEndpoint {
    position: LatLng,
    place: Option<PlaceRecord>,
}

enum EndpointLookup {
    Found(ResolvedEndpoint),
    Failed(DirectionError),
}

pub fn is_my_location(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case(MY_LOCATION)
}

impl MapActionResolver {
    pub(crate) async fn directions(
        &self,
        ticket: &Ticket,
        origin: &str,
        destination: &str,
    ) -> Step<(ActionOutcome, Vec<MapEffect>)> {
        let from = if is_my_location(origin) {
            let position = self.device_position().await;
            self.ensure_current(ticket).await?;
            EndpointLookup::Found(ResolvedEndpoint {
                position,
                place: None,
            })
        } else {
            let found = self.geocode(Endpoint::Origin, origin, destination).await;
            self.ensure_current(ticket).await?;
            found
        };
        let from = match from {
            EndpointLookup::Found(from) => from,
            EndpointLookup::Failed(error) => return Ok(failed(error)),
        };

        let to = self.geocode(Endpoint::Destination, origin, destination).await;
        self.ensure_current(ticket).await?;
        let to = match to {
            EndpointLookup::Found(to) => to,
            EndpointLookup::Failed(error) => return Ok(failed(error)),
        };

        let legs = self.route_all_modes(from.position, to.position).await;
        self.ensure_current(ticket).await?;

        if legs.is_empty() {
            warn!(origin, destination, "No mode returned a route");
            return Ok(failed(DirectionError::no_route(origin, destination)));
        }

        let caps = self.config.distance_caps;
        let (mut within, over): (Vec<_>, Vec<_>) = legs
            .into_iter()
            .partition(|(option, _)| option.distance_value as f64 <= caps.cap_meters(option.mode));

        for (option, _) in &over {
            debug!(mode = %option.mode, distance = option.distance_value, "Route over distance cap");
        }

        if within.is_empty() {
            let shortest = over
                .iter()
                .map(|(option, _)| option)
                .min_by_key(|option| option.distance_value);
            let error = match shortest {
                Some(shortest) => DirectionError::too_long(origin, destination, shortest),
                None => DirectionError::no_route(origin, destination),
            };
            return Ok(failed(error));
        }

        within.sort_by_key(|(option, _)| option.mode);
        let (routes, geometries): (Vec<RouteOption>, Vec<Vec<LatLng>>) = within
            .into_iter()
            .map(|(option, leg)| (option, leg.geometry))
            .unzip();

        let primary_mode = routes[0].mode;
        let primary_geometry = geometries.into_iter().next().unwrap_or_default();

        let mut markers = vec![
            endpoint_marker(&from, origin),
            endpoint_marker(&to, destination),
        ];
        markers.dedup();

        let mut effects = vec![MapEffect::DrawRoute {
            mode: primary_mode,
            geometry: primary_geometry.clone(),
        }];
        effects.push(MapEffect::PlaceMarkers { markers });
        let extent = [from.position, to.position].into_iter().chain(primary_geometry);
        if let Some(bounds) = Bounds::around(extent) {
            effects.push(MapEffect::FitBounds { bounds });
        }

        info!(
            origin,
            destination,
            modes = routes.len(),
            primary = %primary_mode,
            "Directions resolved"
        );

        let result = RouteResult {
            origin: origin.to_string(),
            destination: destination.to_string(),
            origin_place: from.place,
            destination_place: to.place,
            routes,
        };
        Ok((ActionOutcome::RouteFound(result), effects))
    }

    /// Device position within the location timeout, else the viewport centre.
    async fn device_position(&self) -> LatLng {
        if let Some(locator) = &self.locator {
            match tokio::time::timeout(self.config.location_timeout, locator.current_position())
                .await
            {
                Ok(Ok(position)) => return position,
                Ok(Err(e)) => warn!(error = %e, "Device location failed, using map centre"),
                Err(_) => warn!(
                    timeout_ms = self.config.location_timeout.as_millis() as u64,
                    "Device location timed out, using map centre"
                ),
            }
        } else {
            debug!("No device locator, using map centre");
        }
        self.state.read().await.viewport.center
    }

    async fn geocode(&self, side: Endpoint, origin: &str, destination: &str) -> EndpointLookup {
        let query = match side {
            Endpoint::Origin => origin,
            Endpoint::Destination => destination,
        };
        match self.lookup(query).await {
            Ok(Some(place)) => match place.location {
                Some(position) => EndpointLookup::Found(ResolvedEndpoint {
                    position,
                    place: Some(place),
                }),
                None => {
                    debug!(query, "Place has no coordinates");
                    EndpointLookup::Failed(DirectionError::unresolved(side, origin, destination))
                }
            },
            Ok(None) => {
                EndpointLookup::Failed(DirectionError::unresolved(side, origin, destination))
            }
            Err(e) => {
                warn!(query, error = %e, "Geocoding failed");
                EndpointLookup::Failed(DirectionError::unknown(origin, destination, e))
            }
        }
    }

    /// Routes every supported mode concurrently. Failed modes and legs with
    /// unusable measurements are dropped.
    async fn route_all_modes(&self, from: LatLng, to: LatLng) -> Vec<(RouteOption, RouteLeg)> {
        let modes: Vec<TravelMode> = TravelMode::ALL
            .into_iter()
            .filter(|mode| self.routes.supports(*mode))
            .collect();

        let requests = modes.iter().map(|mode| self.routes.route(from, to, *mode));
        let results = join_all(requests).await;

        modes
            .into_iter()
            .zip(results)
            .filter_map(|(mode, result)| match result {
                Ok(leg) if !is_measurable(&leg) => {
                    warn!(
                        mode = %mode,
                        distance_meters = leg.distance_meters,
                        duration_seconds = leg.duration_seconds,
                        "Dropping leg with unusable measurements"
                    );
                    None
                }
                Ok(leg) => Some((
                    RouteOption::from_measurements(mode, leg.distance_meters, leg.duration_seconds),
                    leg,
                )),
                Err(e) => {
                    debug!(mode = %mode, error = %e, "Dropping failed mode");
                    None
                }
            })
            .collect()
    }
}

/// Distance and duration must both be finite and non-negative.
fn is_measurable(leg: &RouteLeg) -> bool {
    [leg.distance_meters, leg.duration_seconds]
        .iter()
        .all(|value| value.is_finite() && *value >= 0.0)
}

fn failed(error: DirectionError) -> (ActionOutcome, Vec<MapEffect>) {
    (ActionOutcome::ActionError(error), vec![MapEffect::ClearRoute])
}

fn endpoint_marker(endpoint: &ResolvedEndpoint, label: &str) -> Marker {
    match &endpoint.place {
        Some(place) => Marker {
            position: endpoint.position,
            title: Some(place.display_name.clone()),
            place_id: Some(place.id.clone()),
        },
        None => Marker::at(endpoint.position, Some(label.to_string())),
    }
}
