//! Line classification rules for the legacy itinerary format.
//!
//! Each rule is a pure function from one normalized line to an optional
//! `LineKind`. `RULES` is evaluated top to bottom and the first match wins,
//! so precedence is the order of that table.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use wayfinder_common::Period;

static LEADING_BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*•+]|\d+[.)])\s+").unwrap());
static ALTERNATIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:alternative|alt|option)\s*:\s*(.+)$").unwrap());
static DAY_OPTION_PERIOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^day\s+(\d+)\s*[-–—,]?\s*option\s+([a-z0-9]+)\s*[-–—,]?\s*(morning|afternoon|evening|accommodation)\s*:\s*(.*)$",
    )
    .unwrap()
});
static DAY_PERIOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^day\s+(\d+)\s*[-–—,]?\s*(morning|afternoon|evening|accommodation)\s*:\s*(.*)$")
        .unwrap()
});
static DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^day\s+(\d+)\s*:\s*(.*)$").unwrap());
static SUGGESTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^suggested(?:\s+places)?\s*:\s*(.+)$").unwrap());
static LABEL_NOISE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:tips?|notes?|travel(?:\s+time)?)\s*:").unwrap());
static TRAVEL_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^[(\[~\s]*(?:about|approx\.?|around)?\s*~?\d+(?:\s*[-–]\s*\d+)?\s*(?:min(?:ute)?s?|hrs?|hours?|h)\b[^:]*$",
    )
    .unwrap()
});

/// What a single line contributes to the itinerary under construction.
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    /// More options for the previous stop.
    Alternative(String),
    DayOptionPeriod {
        day: u32,
        option: String,
        period: Period,
        content: String,
    },
    DayPeriod {
        day: u32,
        period: Period,
        content: String,
    },
    /// Places for a day with no period; they become day-level suggestions.
    Day { day: u32, content: String },
    Suggested(String),
    /// Travel times, tips, notes. Matched so it is explicitly discarded.
    Noise,
}

pub struct LineRule {
    pub name: &'static str,
    pub apply: fn(&str) -> Option<LineKind>,
}

pub static RULES: &[LineRule] = &[
    LineRule {
        name: "alternative",
        apply: alternative,
    },
    LineRule {
        name: "day_option_period",
        apply: day_option_period,
    },
    LineRule {
        name: "day_period",
        apply: day_period,
    },
    LineRule {
        name: "day",
        apply: day,
    },
    LineRule {
        name: "suggested",
        apply: suggested,
    },
    LineRule {
        name: "noise",
        apply: noise,
    },
];

/// Runs the rule table over one raw line.
pub fn classify(line: &str) -> Option<LineKind> {
    matching_rule(line).map(|(_, kind)| kind)
}

/// Like `classify`, also naming the rule that matched.
pub fn matching_rule(line: &str) -> Option<(&'static str, LineKind)> {
    let line = normalize_line(line);
    if line.is_empty() {
        return None;
    }
    let (name, kind) = RULES
        .iter()
        .find_map(|rule| (rule.apply)(&line).map(|kind| (rule.name, kind)))?;
    trace!(rule = name, line = %line, "Legacy line classified");
    Some((name, kind))
}

/// Trims, drops a leading list marker and markdown emphasis. Headings keep
/// their `#` so they never read as itinerary lines.
pub fn normalize_line(line: &str) -> String {
    let line = line.trim();
    let line = LEADING_BULLET_RE.replace(line, "");
    line.replace("**", "").replace("__", "").trim().to_string()
}

fn alternative(line: &str) -> Option<LineKind> {
    let caps = ALTERNATIVE_RE.captures(line)?;
    Some(LineKind::Alternative(caps[1].trim().to_string()))
}

fn day_option_period(line: &str) -> Option<LineKind> {
    let caps = DAY_OPTION_PERIOD_RE.captures(line)?;
    Some(LineKind::DayOptionPeriod {
        day: caps[1].parse().ok()?,
        option: caps[2].to_uppercase(),
        period: Period::parse(&caps[3])?,
        content: caps[4].trim().to_string(),
    })
}

fn day_period(line: &str) -> Option<LineKind> {
    let caps = DAY_PERIOD_RE.captures(line)?;
    Some(LineKind::DayPeriod {
        day: caps[1].parse().ok()?,
        period: Period::parse(&caps[2])?,
        content: caps[3].trim().to_string(),
    })
}

fn day(line: &str) -> Option<LineKind> {
    let caps = DAY_RE.captures(line)?;
    Some(LineKind::Day {
        day: caps[1].parse().ok()?,
        content: caps[2].trim().to_string(),
    })
}

fn suggested(line: &str) -> Option<LineKind> {
    let caps = SUGGESTED_RE.captures(line)?;
    Some(LineKind::Suggested(caps[1].trim().to_string()))
}

fn noise(line: &str) -> Option<LineKind> {
    (LABEL_NOISE_RE.is_match(line) || TRAVEL_ONLY_RE.is_match(line)).then_some(LineKind::Noise)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternative_prefixes() {
        for line in ["Alternative: Orsay", "alt: Orsay", "- Option: Orsay"] {
            assert_eq!(
                classify(line),
                Some(LineKind::Alternative("Orsay".into())),
                "{line}"
            );
        }
    }

    #[test]
    fn day_option_period_beats_day_period() {
        assert_eq!(
            classify("Day 3 Option b Evening: Jazz bar"),
            Some(LineKind::DayOptionPeriod {
                day: 3,
                option: "B".into(),
                period: Period::Evening,
                content: "Jazz bar".into(),
            })
        );
    }

    #[test]
    fn day_period_with_markdown() {
        assert_eq!(
            classify("* **Day 1 - Morning:** Louvre, Tuileries"),
            Some(LineKind::DayPeriod {
                day: 1,
                period: Period::Morning,
                content: "Louvre, Tuileries".into(),
            })
        );
    }

    #[test]
    fn bare_day_line() {
        assert_eq!(
            classify("Day 2: Montmartre"),
            Some(LineKind::Day {
                day: 2,
                content: "Montmartre".into(),
            })
        );
    }

    #[test]
    fn suggested_line() {
        assert_eq!(
            classify("Suggested places: A, B"),
            Some(LineKind::Suggested("A, B".into()))
        );
    }

    #[test]
    fn noise_lines() {
        for line in [
            "Tip: buy the museum pass",
            "Note: closed Mondays",
            "15 min walk",
            "(20 minutes by metro)",
            "~1 hr drive",
            "Travel time: 10 min",
        ] {
            assert_eq!(classify(line), Some(LineKind::Noise), "{line}");
        }
    }

    #[test]
    fn first_matching_rule_is_reported() {
        let rule = |line| matching_rule(line).map(|(name, _)| name);
        assert_eq!(rule("Day 3 Option A Morning: Louvre"), Some("day_option_period"));
        assert_eq!(rule("Day 1 - Evening: Seine cruise"), Some("day_period"));
        assert_eq!(rule("Alternative: Orsay"), Some("alternative"));
        assert_eq!(rule("Tip: go early"), Some("noise"));
        assert_eq!(rule("Paris is lovely in spring."), None);
    }

    #[test]
    fn headings_and_prose_do_not_match() {
        assert_eq!(classify("### Day 1: Arrival"), None);
        assert_eq!(classify("Paris is lovely in spring."), None);
        assert_eq!(classify("   "), None);
    }
}
