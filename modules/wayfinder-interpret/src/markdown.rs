//! Last-resort extraction from markdown: `### Day N` headers and bold spans.

use std::sync::LazyLock;

use regex::Regex;

use wayfinder_common::Itinerary;

static DAY_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mi)^#{2,4}\s*\**\s*day\s+(\d+)\b[^\n]*$").unwrap());
static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*\n]+?)\*\*").unwrap());
/// Bold day labels such as `**Day 1**` or `**Day 2 - Morning:**`.
static DAY_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^day\s+\d+\b").unwrap());

/// Bold labels that structure a response rather than name a place.
const RESERVED: &[&str] = &[
    "morning",
    "afternoon",
    "evening",
    "night",
    "accommodation",
    "tip",
    "tips",
    "note",
    "notes",
    "breakfast",
    "lunch",
    "dinner",
    "travel time",
    "suggested",
    "suggested places",
    "alternative",
    "option",
    "budget",
    "getting there",
    "transport",
];

/// One day per header, or a single flat bucket when there are no headers.
pub fn parse(text: &str) -> Option<Itinerary> {
    let headers: Vec<_> = DAY_HEADER_RE.captures_iter(text).collect();

    if headers.is_empty() {
        let flat = Itinerary::flat(bold_places(text));
        return (!flat.is_empty()).then_some(flat);
    }

    let mut itinerary = Itinerary::default();
    for (i, caps) in headers.iter().enumerate() {
        let Some(header) = caps.get(0) else {
            continue;
        };
        let body_end = headers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(text.len());
        let body = &text[header.end()..body_end];

        let key = format!("Day {}", &caps[1]);
        let day = itinerary.day_mut_or_insert(&key);
        for name in bold_places(body) {
            day.suggest(name);
        }
    }

    Some(itinerary)
}

fn bold_places(text: &str) -> Vec<String> {
    BOLD_RE
        .captures_iter(text)
        .map(|caps| clean_label(&caps[1]))
        .filter(|name| !name.is_empty() && !is_reserved(name))
        .collect()
}

fn clean_label(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(|c: char| c == ':' || c == '.' || c == ',')
        .trim()
        .to_string()
}

fn is_reserved(name: &str) -> bool {
    let lower = name.to_lowercase();
    RESERVED.contains(&lower.as_str()) || DAY_LABEL_RE.is_match(&lower)
}
