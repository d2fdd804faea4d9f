use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use wayfinder_common::{Bounds, DirectionError, LatLng, PlaceRecord, RouteResult, TravelMode};

use crate::channel::Channel;

// --- Outcomes ---

/// What a single map action produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ActionOutcome {
    PlacesFound(Vec<PlaceRecord>),
    RouteFound(RouteResult),
    ViewUpdated,
    ActionError(DirectionError),
}

impl ActionOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, ActionOutcome::ActionError(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub position: LatLng,
    pub title: Option<String>,
    /// Id of the place record this marker stands for, if any.
    pub place_id: Option<String>,
}

impl Marker {
    pub fn at(position: LatLng, title: Option<String>) -> Self {
        Self {
            position,
            title,
            place_id: None,
        }
    }

    /// `None` for records without a location.
    pub fn for_place(place: &PlaceRecord) -> Option<Self> {
        Some(Self {
            position: place.location?,
            title: Some(place.display_name.clone()),
            place_id: Some(place.id.clone()),
        })
    }
}

/// A change the map should make. Applied to `MapState` and returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MapEffect {
    /// Replaces the channel's markers.
    PlaceMarkers { markers: Vec<Marker> },
    CenterOn { center: LatLng, zoom: f64 },
    FitBounds { bounds: Bounds },
    DrawRoute {
        mode: TravelMode,
        geometry: Vec<LatLng>,
    },
    ClearRoute,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub action_id: Uuid,
    pub outcome: ActionOutcome,
    pub effects: Vec<MapEffect>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ResolveStatus {
    Applied(Resolution),
    /// A newer action on the same channel started first; nothing was applied.
    Superseded { action_id: Uuid },
    /// This action id was already submitted.
    Duplicate { action_id: Uuid },
}

impl ResolveStatus {
    pub fn action_id(&self) -> Uuid {
        match self {
            ResolveStatus::Applied(r) => r.action_id,
            ResolveStatus::Superseded { action_id } | ResolveStatus::Duplicate { action_id } => {
                *action_id
            }
        }
    }

    pub fn outcome(&self) -> Option<&ActionOutcome> {
        match self {
            ResolveStatus::Applied(r) => Some(&r.outcome),
            _ => None,
        }
    }

    pub fn into_resolution(self) -> Option<Resolution> {
        match self {
            ResolveStatus::Applied(r) => Some(r),
            _ => None,
        }
    }
}

// --- Map state ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Viewport {
    pub center: LatLng,
    pub zoom: f64,
    /// Set by the last `FitBounds`, cleared by `CenterOn`.
    pub bounds: Option<Bounds>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteOverlay {
    pub mode: TravelMode,
    pub geometry: Vec<LatLng>,
}

/// Everything the resolver has drawn, per channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapState {
    pub viewport: Viewport,
    pub markers: BTreeMap<Channel, Vec<Marker>>,
    pub routes: BTreeMap<Channel, RouteOverlay>,
}

impl MapState {
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self {
            viewport: Viewport {
                center,
                zoom,
                bounds: None,
            },
            markers: BTreeMap::new(),
            routes: BTreeMap::new(),
        }
    }

    pub fn apply(&mut self, channel: &Channel, effects: &[MapEffect]) {
        for effect in effects {
            match effect {
                MapEffect::PlaceMarkers { markers } => {
                    self.markers.insert(channel.clone(), markers.clone());
                }
                MapEffect::CenterOn { center, zoom } => {
                    self.viewport = Viewport {
                        center: *center,
                        zoom: *zoom,
                        bounds: None,
                    };
                }
                MapEffect::FitBounds { bounds } => {
                    self.viewport.center = bounds.center();
                    self.viewport.bounds = Some(*bounds);
                }
                MapEffect::DrawRoute { mode, geometry } => {
                    self.routes.insert(
                        channel.clone(),
                        RouteOverlay {
                            mode: *mode,
                            geometry: geometry.clone(),
                        },
                    );
                }
                MapEffect::ClearRoute => {
                    self.routes.remove(channel);
                }
            }
        }
    }

    pub fn markers(&self, channel: &Channel) -> &[Marker] {
        self.markers.get(channel).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn route(&self, channel: &Channel) -> Option<&RouteOverlay> {
        self.routes.get(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effects_update_only_their_channel() {
        let mut state = MapState::new(LatLng::new(0.0, 0.0), 3.0);
        let left = Channel::from("left");
        let right = Channel::from("right");
        let marker = Marker::at(LatLng::new(1.0, 2.0), None);

        state.apply(
            &left,
            &[
                MapEffect::PlaceMarkers {
                    markers: vec![marker.clone()],
                },
                MapEffect::DrawRoute {
                    mode: TravelMode::Walking,
                    geometry: vec![LatLng::new(1.0, 2.0)],
                },
            ],
        );
        state.apply(&right, &[MapEffect::ClearRoute]);

        assert_eq!(state.markers(&left), &[marker]);
        assert!(state.markers(&right).is_empty());
        assert!(state.route(&left).is_some());

        state.apply(&left, &[MapEffect::ClearRoute]);
        assert!(state.route(&left).is_none());
    }

    #[test]
    fn fit_bounds_recentres() {
        let mut state = MapState::new(LatLng::new(0.0, 0.0), 3.0);
        let bounds = Bounds::around([LatLng::new(10.0, 10.0), LatLng::new(20.0, 30.0)]).unwrap();
        state.apply(&Channel::default(), &[MapEffect::FitBounds { bounds }]);
        assert_eq!(state.viewport.center, LatLng::new(15.0, 20.0));
        assert_eq!(state.viewport.bounds, Some(bounds));

        state.apply(
            &Channel::default(),
            &[MapEffect::CenterOn {
                center: LatLng::new(1.0, 1.0),
                zoom: 12.0,
            }],
        );
        assert!(state.viewport.bounds.is_none());
    }

    #[test]
    fn marker_for_unlocated_place_is_none() {
        let place = PlaceRecord::new("x", "Nowhere", "");
        assert!(Marker::for_place(&place).is_none());
        let place = place.with_location(1.0, 2.0);
        assert_eq!(Marker::for_place(&place).unwrap().place_id.as_deref(), Some("x"));
    }
}
