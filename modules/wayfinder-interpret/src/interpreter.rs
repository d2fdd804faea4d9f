use serde::Serialize;
use tracing::{debug, warn};

use wayfinder_common::Itinerary;

use crate::blocks::{clean_text, find_block, follow_up_lines, json_body, remove_spans, BlockKind};
use crate::structured::{parse_places_json, PlacesError};
use crate::{legacy, markdown};

/// Which parse path produced the itinerary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItinerarySource {
    Structured,
    Legacy,
    Markdown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interpretation {
    /// Display text with all machine markup removed.
    pub cleaned_text: String,
    pub itinerary: Option<Itinerary>,
    pub follow_ups: Vec<String>,
    pub source: Option<ItinerarySource>,
}

impl Interpretation {
    pub fn has_places(&self) -> bool {
        self.itinerary.as_ref().is_some_and(|i| !i.is_empty())
    }
}

/// Parses one model response. Never fails: malformed markup degrades to the
/// next parse path and, at worst, to no itinerary.
#[derive(Debug, Clone, Copy)]
pub struct ResponseInterpreter {
    legacy_fallback: bool,
    markdown_fallback: bool,
}

impl Default for ResponseInterpreter {
    fn default() -> Self {
        Self {
            legacy_fallback: true,
            markdown_fallback: true,
        }
    }
}

impl ResponseInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only trust the `[PLACES]` block.
    pub fn structured_only() -> Self {
        Self {
            legacy_fallback: false,
            markdown_fallback: false,
        }
    }

    pub fn with_markdown_fallback(mut self, enabled: bool) -> Self {
        self.markdown_fallback = enabled;
        self
    }

    pub fn interpret(&self, raw: &str) -> Interpretation {
        let follow_block = find_block(raw, BlockKind::FollowUp);
        let places_block = find_block(raw, BlockKind::Places);

        let follow_ups = follow_block
            .as_ref()
            .map(|b| follow_up_lines(b.body))
            .unwrap_or_default();

        let spans: Vec<_> = [&follow_block, &places_block]
            .into_iter()
            .flatten()
            .map(|b| b.span.clone())
            .collect();
        let outside = remove_spans(raw, &spans);

        let mut result = None;
        if let Some(block) = &places_block {
            match structured(block.body) {
                Ok(itinerary) => result = Some((itinerary, ItinerarySource::Structured)),
                Err(e) => warn!(error = %e, "Places block unusable, falling back"),
            }
        }

        if result.is_none() && self.legacy_fallback {
            result = legacy::parse(&outside).map(|i| (i, ItinerarySource::Legacy));
        }

        if result.is_none() && places_block.is_none() && self.markdown_fallback {
            result = markdown::parse(&outside).map(|i| (i, ItinerarySource::Markdown));
        }

        let (itinerary, source) = result.unzip();
        debug!(
            source = ?source,
            follow_ups = follow_ups.len(),
            "Interpreted response"
        );

        Interpretation {
            cleaned_text: clean_text(&outside),
            itinerary,
            follow_ups,
            source,
        }
    }
}

fn structured(body: &str) -> Result<Itinerary, PlacesError> {
    let json = json_body(body).ok_or(PlacesError::Empty)?;
    parse_places_json(&json)
}

/// `ResponseInterpreter::default().interpret`.
pub fn interpret(raw: &str) -> Interpretation {
    ResponseInterpreter::default().interpret(raw)
}
