//! The JSON payload of a `[PLACES]` block.

use std::collections::BTreeMap;

use schemars::{schema::RootSchema, schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use wayfinder_common::{Itinerary, ItineraryDay, Period, Stop};

/// What the model is asked to emit inside `[PLACES]`. `days` and `suggested`
/// are mutually exclusive.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlacesBlock {
    /// Day-by-day itinerary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<Vec<DayEntry>>,
    /// Flat list of recommended places, for non-itinerary answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DayEntry {
    /// Unique label such as "Day 1" or "Day 3 (Option A)".
    #[serde(default)]
    pub key: Option<String>,
    /// Stops keyed by "Morning", "Afternoon", "Evening" or "Accommodation".
    #[serde(default)]
    pub periods: Option<BTreeMap<String, Vec<StopEntry>>>,
    /// Places recommended for the day but not scheduled.
    #[serde(default)]
    pub suggested: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum StopEntry {
    Slot(SlotEntry),
    Name(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SlotEntry {
    /// Alternative place names for the same slot ("X or Y").
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub optional: bool,
    /// Estimate from the previous stop, e.g. "10 min walk".
    #[serde(rename = "travelTime", default)]
    pub travel_time: Option<String>,
}

#[derive(Error, Debug)]
pub enum PlacesError {
    #[error("places block is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("places block contains no usable days or suggestions")]
    Empty,
}

/// JSON Schema of the places block, for embedding in prompts.
pub fn places_block_schema() -> RootSchema {
    schema_for!(PlacesBlock)
}

/// Strictly parses a places-block JSON object into an `Itinerary`.
pub fn parse_places_json(body: &str) -> Result<Itinerary, PlacesError> {
    let block: PlacesBlock = serde_json::from_str(body)?;
    let itinerary = block.into_itinerary();
    if itinerary.is_empty() {
        return Err(PlacesError::Empty);
    }
    Ok(itinerary)
}

impl PlacesBlock {
    pub fn into_itinerary(self) -> Itinerary {
        let mut itinerary = Itinerary::default();

        for entry in self.days.unwrap_or_default() {
            let Some(day) = entry.into_day() else {
                continue;
            };
            match itinerary.days.iter_mut().find(|d| d.key == day.key) {
                Some(existing) => {
                    debug!(key = %day.key, "Merging repeated day key");
                    existing.merge(day);
                    existing.tidy();
                }
                None => itinerary.days.push(day),
            }
        }

        if itinerary.days.is_empty() {
            return Itinerary::flat(self.suggested.unwrap_or_default());
        }
        if self.suggested.is_some_and(|s| !s.is_empty()) {
            debug!("Ignoring top-level suggestions alongside days");
        }
        itinerary
    }
}

impl DayEntry {
    fn into_day(self) -> Option<ItineraryDay> {
        let key = self.key.as_deref().map(str::trim).unwrap_or_default();
        if key.is_empty() {
            debug!("Skipping day with blank key");
            return None;
        }

        let mut day = ItineraryDay::new(key);
        for (label, stops) in self.periods.unwrap_or_default() {
            let Some(period) = Period::parse(&label) else {
                debug!(period = %label, day = %key, "Ignoring unknown period");
                continue;
            };
            for stop in stops.into_iter().filter_map(StopEntry::into_stop) {
                day.push_stop(period, stop);
            }
        }
        for name in self.suggested.unwrap_or_default() {
            day.suggest(name);
        }

        day.tidy();
        (!day.is_empty()).then_some(day)
    }
}

impl StopEntry {
    fn into_stop(self) -> Option<Stop> {
        match self {
            StopEntry::Name(name) => Stop::new([name]),
            StopEntry::Slot(slot) => {
                let mut stop = Stop::new(&slot.options)?;
                stop.optional = slot.optional;
                if let Some(travel) = slot.travel_time {
                    stop = stop.with_travel_time(travel);
                }
                Some(stop)
            }
        }
    }
}
