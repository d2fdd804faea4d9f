use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::format::{format_distance, format_duration};

// --- Geo Types ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5},{:.5}", self.lat, self.lng)
    }
}

/// Axis-aligned lat/lng box. Does not handle antimeridian wrap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    /// Smallest box containing every point. `None` for an empty input.
    pub fn around(points: impl IntoIterator<Item = LatLng>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let init = Bounds {
            south: first.lat,
            west: first.lng,
            north: first.lat,
            east: first.lng,
        };
        Some(iter.fold(init, |b, p| Bounds {
            south: b.south.min(p.lat),
            west: b.west.min(p.lng),
            north: b.north.max(p.lat),
            east: b.east.max(p.lng),
        }))
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }
}

// --- Places ---

/// A provider-resolved place. The engine never fabricates `location`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRecord {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub formatted_address: String,
    pub location: Option<LatLng>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_rating_count: Option<u32>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub photo_urls: Vec<String>,
}

impl PlaceRecord {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        formatted_address: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            formatted_address: formatted_address.into(),
            location: None,
            rating: None,
            user_rating_count: None,
            types: Vec::new(),
            photo_urls: Vec::new(),
        }
    }

    pub fn with_location(mut self, lat: f64, lng: f64) -> Self {
        self.location = Some(LatLng::new(lat, lng));
        self
    }

    pub fn with_rating(mut self, rating: f64, count: u32) -> Self {
        self.rating = Some(rating);
        self.user_rating_count = Some(count);
        self
    }
}

// --- Routes ---

/// Travel modality. Declaration order is the fixed route priority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Driving,
    Walking,
    Bicycling,
    Transit,
}

impl TravelMode {
    pub const ALL: [TravelMode; 4] = [
        TravelMode::Driving,
        TravelMode::Walking,
        TravelMode::Bicycling,
        TravelMode::Transit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Walking => "walking",
            TravelMode::Bicycling => "bicycling",
            TravelMode::Transit => "transit",
        }
    }
}

impl std::fmt::Display for TravelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOption {
    pub mode: TravelMode,
    /// Human-readable, e.g. "1 hr 5 min".
    pub duration: String,
    /// Human-readable, e.g. "12.4 km".
    pub distance: String,
    /// Seconds.
    pub duration_value: u64,
    /// Meters.
    pub distance_value: u64,
}

impl RouteOption {
    pub fn from_measurements(mode: TravelMode, distance_meters: f64, duration_seconds: f64) -> Self {
        let distance_value = distance_meters.max(0.0).round() as u64;
        let duration_value = duration_seconds.max(0.0).round() as u64;
        Self {
            mode,
            duration: format_duration(duration_value),
            distance: format_distance(distance_value),
            duration_value,
            distance_value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    pub origin: String,
    pub destination: String,
    pub origin_place: Option<PlaceRecord>,
    pub destination_place: Option<PlaceRecord>,
    /// At most one entry per mode, in `TravelMode` order.
    pub routes: Vec<RouteOption>,
}

impl RouteResult {
    pub fn primary(&self) -> Option<&RouteOption> {
        self.routes.first()
    }

    pub fn route(&self, mode: TravelMode) -> Option<&RouteOption> {
        self.routes.iter().find(|r| r.mode == mode)
    }
}

// --- Map actions ---

/// One map intent. Closed set; consumers match exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MapIntent {
    SearchOne {
        query: String,
    },
    SearchMany {
        queries: Vec<String>,
    },
    Goto {
        lat: f64,
        lng: f64,
        zoom: Option<f64>,
        title: Option<String>,
    },
    Marker {
        lat: f64,
        lng: f64,
        title: Option<String>,
    },
    Directions {
        origin: String,
        destination: String,
    },
}

impl MapIntent {
    pub fn kind(&self) -> &'static str {
        match self {
            MapIntent::SearchOne { .. } => "search_one",
            MapIntent::SearchMany { .. } => "search_many",
            MapIntent::Goto { .. } => "goto",
            MapIntent::Marker { .. } => "marker",
            MapIntent::Directions { .. } => "directions",
        }
    }
}

/// An intent stamped with a fresh id. The id drives last-action-wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapAction {
    pub id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub intent: MapIntent,
}

impl MapAction {
    pub fn new(intent: MapIntent) -> Self {
        Self {
            id: Uuid::new_v4(),
            issued_at: Utc::now(),
            intent,
        }
    }

    pub fn search_one(query: impl Into<String>) -> Self {
        Self::new(MapIntent::SearchOne {
            query: query.into(),
        })
    }

    pub fn search_many<S: Into<String>>(queries: impl IntoIterator<Item = S>) -> Self {
        Self::new(MapIntent::SearchMany {
            queries: queries.into_iter().map(Into::into).collect(),
        })
    }

    pub fn goto(lat: f64, lng: f64, zoom: Option<f64>, title: Option<String>) -> Self {
        Self::new(MapIntent::Goto {
            lat,
            lng,
            zoom,
            title,
        })
    }

    pub fn marker(lat: f64, lng: f64, title: Option<String>) -> Self {
        Self::new(MapIntent::Marker { lat, lng, title })
    }

    pub fn directions(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self::new(MapIntent::Directions {
            origin: origin.into(),
            destination: destination.into(),
        })
    }
}
