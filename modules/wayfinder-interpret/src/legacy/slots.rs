//! Splitting the content of one legacy line into stops.
//!
//! Commas separate sibling stops, `|` separates inline alternatives, and the
//! "X or Y" / "X at P1, or P2" phrasings become two alternatives. The phrase
//! patterns are deliberately narrow; anything they don't cover stays one name.

use std::sync::LazyLock;

use regex::Regex;

use wayfinder_common::Stop;

static COMMA_OR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i),\s+or\s+").unwrap());
static AT_OR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.+?)\s+at\s+(.+?)\s+or\s+(.+)$").unwrap());
static OR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^(.+?)\s+or\s+(.+)$").unwrap());
static TRAILING_PAREN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(([^()]*)\)\s*$").unwrap());
static OPTIONAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*optional\s*$").unwrap());
static TRAVEL_HINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d+\s*(?:min(?:ute)?s?|hrs?|hours?|h)\b|\b(?:walk|drive|metro|bus|train|taxi|bike)\b")
        .unwrap()
});

/// Parses a line's content into sibling stops.
pub fn parse_stops(content: &str) -> Vec<Stop> {
    let content = content.replace("**", "");
    let content = content.trim().trim_end_matches('.');
    let content = COMMA_OR_RE.replace_all(content, " or ");

    split_top_level(&content, ',')
        .into_iter()
        .filter_map(parse_slot)
        .collect()
}

/// Every name in `content`, ignoring how the stops are grouped.
pub fn parse_names(content: &str) -> Vec<String> {
    parse_stops(content)
        .into_iter()
        .flat_map(|stop| stop.options)
        .collect()
}

fn parse_slot(text: &str) -> Option<Stop> {
    let mut name = text.trim().to_string();
    let mut optional = false;
    let mut travel_time = None;

    // At most one travel estimate and one "(optional)" marker, in either order.
    for _ in 0..2 {
        let Some(caps) = TRAILING_PAREN_RE.captures(&name) else {
            break;
        };
        let inner = caps[1].trim().to_string();
        let start = caps.get(0).map(|m| m.start()).unwrap_or(name.len());
        if OPTIONAL_RE.is_match(&inner) {
            optional = true;
        } else if travel_time.is_none() && TRAVEL_HINT_RE.is_match(&inner) {
            travel_time = Some(inner);
        } else {
            break;
        }
        name.truncate(start);
    }

    let mut stop = Stop::new(split_alternatives(&name))?;
    stop.optional = optional;
    if let Some(travel) = travel_time {
        stop = stop.with_travel_time(travel);
    }
    Some(stop)
}

/// `|` first, then the phrase patterns in fixed order.
pub fn split_alternatives(text: &str) -> Vec<String> {
    if text.contains('|') {
        return text.split('|').map(|s| s.trim().to_string()).collect();
    }
    if let Some(caps) = AT_OR_RE.captures(text) {
        return vec![caps[2].trim().to_string(), caps[3].trim().to_string()];
    }
    if let Some(caps) = OR_RE.captures(text) {
        return vec![caps[1].trim().to_string(), caps[2].trim().to_string()];
    }
    vec![text.trim().to_string()]
}

/// Splits on `sep` outside parentheses.
fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}
