use std::collections::{BTreeMap, HashSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Label of the single bucket produced for flat (non-day) suggestions.
pub const SUGGESTED_BUCKET: &str = "Suggested Places";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum Period {
    Morning,
    Afternoon,
    Evening,
    Accommodation,
}

impl Period {
    pub const ALL: [Period; 4] = [
        Period::Morning,
        Period::Afternoon,
        Period::Evening,
        Period::Accommodation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Morning => "Morning",
            Period::Afternoon => "Afternoon",
            Period::Evening => "Evening",
            Period::Accommodation => "Accommodation",
        }
    }

    /// Case-insensitive parse of a period label.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(label))
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scheduled slot. More than one option means mutually exclusive alternatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub options: Vec<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(rename = "travelTime", default)]
    pub travel_time: Option<String>,
}

impl Stop {
    /// Trims every option and drops blanks. `None` when nothing is left.
    pub fn new<S: AsRef<str>>(options: impl IntoIterator<Item = S>) -> Option<Self> {
        let options: Vec<String> = options
            .into_iter()
            .map(|o| o.as_ref().trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        if options.is_empty() {
            return None;
        }
        Some(Self {
            options,
            optional: false,
            travel_time: None,
        })
    }

    pub fn with_travel_time(mut self, travel_time: impl Into<String>) -> Self {
        let travel_time = travel_time.into();
        let trimmed = travel_time.trim();
        self.travel_time = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    pub fn mark_optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn is_alternative(&self) -> bool {
        self.options.len() > 1
    }

    pub fn primary(&self) -> &str {
        self.options.first().map(String::as_str).unwrap_or_default()
    }

    /// Appends alternatives, skipping blanks and exact duplicates.
    pub fn add_alternatives<S: AsRef<str>>(&mut self, names: impl IntoIterator<Item = S>) {
        for name in names {
            let name = name.as_ref().trim();
            if !name.is_empty() && !self.options.iter().any(|o| o == name) {
                self.options.push(name.to_string());
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryDay {
    pub key: String,
    #[serde(default)]
    pub periods: BTreeMap<Period, Vec<Stop>>,
    #[serde(default)]
    pub suggested: Vec<String>,
}

impl ItineraryDay {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            periods: BTreeMap::new(),
            suggested: Vec::new(),
        }
    }

    pub fn push_stop(&mut self, period: Period, stop: Stop) {
        self.periods.entry(period).or_default().push(stop);
    }

    pub fn with_stop(mut self, period: Period, stop: Stop) -> Self {
        self.push_stop(period, stop);
        self
    }

    pub fn suggest(&mut self, name: impl AsRef<str>) {
        let name = name.as_ref().trim();
        if !name.is_empty() && !self.suggested.iter().any(|s| s == name) {
            self.suggested.push(name.to_string());
        }
    }

    pub fn with_suggestion(mut self, name: impl AsRef<str>) -> Self {
        self.suggest(name);
        self
    }

    pub fn stops(&self) -> impl Iterator<Item = (Period, &Stop)> {
        self.periods
            .iter()
            .flat_map(|(period, stops)| stops.iter().map(move |s| (*period, s)))
    }

    /// The most recently added stop, for continuation lines.
    pub fn last_stop_mut(&mut self, period: Period) -> Option<&mut Stop> {
        self.periods.get_mut(&period).and_then(|s| s.last_mut())
    }

    /// Every option and suggestion of the day, each once.
    pub fn places(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.stops()
            .flat_map(|(_, stop)| stop.options.iter())
            .chain(self.suggested.iter())
            .filter(|name| seen.insert(name.as_str()))
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.suggested.is_empty() && self.periods.values().all(|s| s.is_empty())
    }

    /// Drops empty periods and removes suggestions that are already scheduled.
    pub fn tidy(&mut self) {
        self.periods.retain(|_, stops| !stops.is_empty());
        let scheduled: HashSet<String> = self
            .stops()
            .flat_map(|(_, stop)| stop.options.iter().cloned())
            .collect();
        let mut seen = HashSet::new();
        self.suggested
            .retain(|s| !scheduled.contains(s) && seen.insert(s.clone()));
    }

    /// Appends `other`'s stops and suggestions onto this day.
    pub fn merge(&mut self, other: ItineraryDay) {
        for (period, stops) in other.periods {
            self.periods.entry(period).or_default().extend(stops);
        }
        for name in other.suggested {
            self.suggest(name);
        }
    }
}

/// One label plus its places, as rendered in chip rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceBucket {
    pub label: String,
    pub places: Vec<String>,
}

/// Either `days` or the flat `suggested` form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Itinerary {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days: Vec<ItineraryDay>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested: Vec<String>,
}

impl Itinerary {
    pub fn from_days(days: Vec<ItineraryDay>) -> Self {
        Self {
            days,
            suggested: Vec::new(),
        }
    }

    pub fn flat<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> Self {
        let mut seen = HashSet::new();
        let suggested = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_string())
            .filter(|n| !n.is_empty() && seen.insert(n.clone()))
            .collect();
        Self {
            days: Vec::new(),
            suggested,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.days.iter().all(ItineraryDay::is_empty) && self.suggested.is_empty()
    }

    pub fn is_flat(&self) -> bool {
        self.days.is_empty() && !self.suggested.is_empty()
    }

    pub fn day(&self, key: &str) -> Option<&ItineraryDay> {
        self.days.iter().find(|d| d.key == key)
    }

    /// Finds the day with `key`, creating it at the end if absent.
    pub fn day_mut_or_insert(&mut self, key: &str) -> &mut ItineraryDay {
        let idx = match self.days.iter().position(|d| d.key == key) {
            Some(idx) => idx,
            None => {
                self.days.push(ItineraryDay::new(key));
                self.days.len() - 1
            }
        };
        &mut self.days[idx]
    }

    pub fn buckets(&self) -> Vec<PlaceBucket> {
        if self.days.is_empty() {
            if self.suggested.is_empty() {
                return Vec::new();
            }
            return vec![PlaceBucket {
                label: SUGGESTED_BUCKET.to_string(),
                places: self.suggested.clone(),
            }];
        }
        self.days
            .iter()
            .map(|d| PlaceBucket {
                label: d.key.clone(),
                places: d.places(),
            })
            .collect()
    }

    /// JSON body of a places block.
    pub fn to_places_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Full `[PLACES]...[/PLACES]` block.
    pub fn to_places_block(&self) -> serde_json::Result<String> {
        Ok(format!("[PLACES]\n{}\n[/PLACES]", self.to_places_json()?))
    }
}
