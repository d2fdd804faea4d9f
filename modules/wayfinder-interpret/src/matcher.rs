//! Fuzzy linking of itinerary stop text to provider place records.
//!
//! Scoring is additive and deterministic:
//!
//! | signal                                               | points |
//! |------------------------------------------------------|--------|
//! | normalized names equal                               | 100    |
//! | cleaned display name is a substring of the stop text | 80     |
//! | ...and the stop text starts with it                  | +20    |
//! | either normalized string contains the other          | 50     |
//! | normalized address and stop text overlap             | 10     |
//!
//! The strictly highest positive score wins; ties keep the earlier candidate.

use std::sync::LazyLock;

use regex::Regex;

use wayfinder_common::PlaceRecord;

const EXACT: u32 = 100;
const RAW_SUBSTRING: u32 = 80;
const RAW_PREFIX: u32 = 20;
const CONTAINS: u32 = 50;
const ADDRESS: u32 = 10;

static PAREN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^)]*\)").unwrap());
static PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:alternative|alt|option|accommodation)\s*:\s*").unwrap()
});
static PUNCT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}\s]").unwrap());
static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Clone, Copy)]
pub struct PlaceMatcher {
    /// Trailing tokens dropped from stop text, usually "City Country".
    trailing_tokens: usize,
}

impl Default for PlaceMatcher {
    fn default() -> Self {
        Self { trailing_tokens: 2 }
    }
}

impl PlaceMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trailing_tokens(mut self, n: usize) -> Self {
        self.trailing_tokens = n;
        self
    }

    pub fn find_best_match<'a>(
        &self,
        stop_text: &str,
        candidates: &'a [PlaceRecord],
    ) -> Option<&'a PlaceRecord> {
        let mut best: Option<(&PlaceRecord, u32)> = None;
        for candidate in candidates {
            let score = self.score(stop_text, candidate);
            if score > best.map_or(0, |(_, s)| s) {
                best = Some((candidate, score));
            }
        }
        best.map(|(record, _)| record)
    }

    /// Every positively scoring candidate, best first. Stable for ties.
    pub fn rank<'a>(
        &self,
        stop_text: &str,
        candidates: &'a [PlaceRecord],
    ) -> Vec<(&'a PlaceRecord, u32)> {
        let mut ranked: Vec<_> = candidates
            .iter()
            .map(|c| (c, self.score(stop_text, c)))
            .filter(|(_, score)| *score > 0)
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    pub fn score(&self, stop_text: &str, record: &PlaceRecord) -> u32 {
        let raw_stop = clean(stop_text);
        let raw_name = clean(&record.display_name);
        let stop = self.normalize_stop(stop_text);
        let name = normalize(&record.display_name);
        let address = normalize(&record.formatted_address);

        let mut score = 0;
        if !stop.is_empty() && stop == name {
            score += EXACT;
        }
        if !raw_name.is_empty() && raw_stop.contains(&raw_name) {
            score += RAW_SUBSTRING;
            if raw_stop.starts_with(&raw_name) {
                score += RAW_PREFIX;
            }
        }
        if !stop.is_empty() && !name.is_empty() && (stop.contains(&name) || name.contains(&stop)) {
            score += CONTAINS;
        }
        if !stop.is_empty()
            && !address.is_empty()
            && (address.contains(&stop) || stop.contains(&address))
        {
            score += ADDRESS;
        }
        score
    }

    fn normalize_stop(&self, text: &str) -> String {
        let normalized = normalize(text);
        let tokens: Vec<&str> = normalized.split(' ').collect();
        if tokens.len() > self.trailing_tokens {
            tokens[..tokens.len() - self.trailing_tokens].join(" ")
        } else {
            normalized
        }
    }
}

/// `PlaceMatcher::default().find_best_match`.
pub fn find_best_match<'a>(
    stop_text: &str,
    candidates: &'a [PlaceRecord],
) -> Option<&'a PlaceRecord> {
    PlaceMatcher::default().find_best_match(stop_text, candidates)
}

/// Markup, asides and label prefixes removed; lower-cased.
fn clean(text: &str) -> String {
    let text = text.replace("**", "");
    let text = PAREN_RE.replace_all(&text, " ");
    let text = PREFIX_RE.replace(&text, "");
    text.trim().to_lowercase()
}

/// `clean`, then punctuation dropped and whitespace collapsed.
fn normalize(text: &str) -> String {
    let text = clean(text);
    let text = PUNCT_RE.replace_all(&text, "");
    SPACE_RE.replace_all(text.trim(), " ").into_owned()
}
