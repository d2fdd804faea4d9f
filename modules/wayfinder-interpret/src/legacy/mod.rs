//! Heuristic parser for responses that predate the `[PLACES]` contract.
//!
//! `rules` classifies each line; this module owns the only mutable state and
//! applies the classified lines to an itinerary under construction.

pub mod rules;
pub mod slots;

use tracing::debug;

use wayfinder_common::{Itinerary, Period};

use self::rules::{classify, LineKind};
use self::slots::{parse_names, parse_stops};

/// Parses line-oriented itinerary text. `None` when no line contributed a place.
pub fn parse(text: &str) -> Option<Itinerary> {
    let mut parser = LegacyParser::default();
    for line in text.lines() {
        if let Some(kind) = classify(line) {
            parser.apply(kind);
        }
    }
    parser.finish()
}

#[derive(Default)]
struct LegacyParser {
    itinerary: Itinerary,
    /// Day key of the most recent day line.
    current_day: Option<String>,
    /// Where the last stop went, for `Alternative:` continuations.
    last_slot: Option<(String, Period)>,
    /// `Suggested:` lines seen before any day.
    pending: Vec<String>,
}

impl LegacyParser {
    fn apply(&mut self, kind: LineKind) {
        match kind {
            LineKind::Alternative(content) => self.extend_last_stop(&content),
            LineKind::DayOptionPeriod {
                day,
                option,
                period,
                content,
            } => self.add_stops(format!("Day {day} (Option {option})"), period, &content),
            LineKind::DayPeriod {
                day,
                period,
                content,
            } => self.add_stops(format!("Day {day}"), period, &content),
            LineKind::Day { day, content } => {
                let key = format!("Day {day}");
                let entry = self.itinerary.day_mut_or_insert(&key);
                for name in parse_names(&content) {
                    entry.suggest(name);
                }
                self.current_day = Some(key);
                self.last_slot = None;
            }
            LineKind::Suggested(content) => {
                let names = parse_names(&content);
                match &self.current_day {
                    Some(key) => {
                        let entry = self.itinerary.day_mut_or_insert(key);
                        for name in names {
                            entry.suggest(name);
                        }
                    }
                    None => self.pending.extend(names),
                }
            }
            LineKind::Noise => {}
        }
    }

    fn add_stops(&mut self, key: String, period: Period, content: &str) {
        let entry = self.itinerary.day_mut_or_insert(&key);
        let stops = parse_stops(content);
        let added = !stops.is_empty();
        for stop in stops {
            entry.push_stop(period, stop);
        }
        if added {
            self.last_slot = Some((key.clone(), period));
        }
        self.current_day = Some(key);
    }

    fn extend_last_stop(&mut self, content: &str) {
        let Some((key, period)) = &self.last_slot else {
            debug!(content, "Alternative line with no preceding stop");
            return;
        };
        let names = parse_names(content);
        let stop = self
            .itinerary
            .days
            .iter_mut()
            .find(|d| &d.key == key)
            .and_then(|d| d.last_stop_mut(*period));
        if let Some(stop) = stop {
            stop.add_alternatives(names);
        }
    }

    fn finish(self) -> Option<Itinerary> {
        let LegacyParser {
            mut itinerary,
            pending,
            ..
        } = self;

        for day in &mut itinerary.days {
            day.tidy();
        }
        itinerary.days.retain(|d| !d.is_empty());

        if itinerary.days.is_empty() {
            let flat = Itinerary::flat(pending);
            return (!flat.is_empty()).then_some(flat);
        }

        if !pending.is_empty() {
            let first = &mut itinerary.days[0];
            let existing = std::mem::take(&mut first.suggested);
            for name in pending.into_iter().chain(existing) {
                first.suggest(name);
            }
            first.tidy();
        }

        debug!(days = itinerary.days.len(), "Legacy parser produced itinerary");
        Some(itinerary)
    }
}
