//! Delimited markup blocks inside a model response: `[PLACES]` and `[FOLLOWUP]`.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static PLACES_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\[PLACES\]").unwrap());
static PLACES_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[/PLACES\]").unwrap());
static FOLLOWUP_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[FOLLOWUP\]").unwrap());
static FOLLOWUP_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[/FOLLOWUP\]").unwrap());
static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*•]+|\d+[.)])\s*").unwrap());
static FENCE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*```[A-Za-z0-9_-]*[ \t]*(?:\r?\n|$)").unwrap());
static ACTION_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\{\s*"action"\s*:"#).unwrap());
static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Places,
    FollowUp,
}

impl BlockKind {
    fn open(&self) -> &'static Regex {
        match self {
            BlockKind::Places => &PLACES_OPEN_RE,
            BlockKind::FollowUp => &FOLLOWUP_OPEN_RE,
        }
    }

    fn close(&self) -> &'static Regex {
        match self {
            BlockKind::Places => &PLACES_CLOSE_RE,
            BlockKind::FollowUp => &FOLLOWUP_CLOSE_RE,
        }
    }

    /// Opening marker of the other block, which ends an unterminated block.
    fn sibling_open(&self) -> &'static Regex {
        match self {
            BlockKind::Places => &FOLLOWUP_OPEN_RE,
            BlockKind::FollowUp => &PLACES_OPEN_RE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    pub kind: BlockKind,
    /// Text between the markers.
    pub body: &'a str,
    /// Byte range of the whole block in the source, markers included.
    pub span: Range<usize>,
}

/// Finds the first block of `kind`. A missing close marker runs the block to
/// the next sibling block or to the end of the text.
pub fn find_block(text: &str, kind: BlockKind) -> Option<Block<'_>> {
    let open = kind.open().find(text)?;
    let rest = &text[open.end()..];

    let (body_end, span_end) = match kind.close().find(rest) {
        Some(close) => (open.end() + close.start(), open.end() + close.end()),
        None => {
            let end = kind
                .sibling_open()
                .find(rest)
                .map(|m| open.end() + m.start())
                .unwrap_or(text.len());
            (end, end)
        }
    };

    Some(Block {
        kind,
        body: &text[open.end()..body_end],
        span: open.start()..span_end,
    })
}

/// Follow-up suggestions, one per non-empty line, bullet markers removed.
pub fn follow_up_lines(body: &str) -> Vec<String> {
    body.lines()
        .map(|line| BULLET_RE.replace(line.trim(), "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// The JSON object inside a places block: fences removed, first `{` to last `}`.
pub fn json_body(body: &str) -> Option<String> {
    let unfenced = strip_code_fences(body);
    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    if end < start {
        return None;
    }
    Some(unfenced[start..=end].to_string())
}

pub fn strip_code_fences(text: &str) -> String {
    FENCE_LINE_RE.replace_all(text, "").replace("```", "")
}

/// Removes `{"action": ...}` objects. Unbalanced fragments are left alone.
pub fn strip_action_fragments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    while let Some(m) = ACTION_START_RE.find(&text[cursor..]) {
        let start = cursor + m.start();
        match matching_brace(text, start) {
            Some(end) => {
                out.push_str(&text[cursor..start]);
                cursor = end + 1;
            }
            None => break,
        }
    }
    out.push_str(&text[cursor..]);
    out
}

/// Index of the `}` closing the object that opens at `open`, skipping string contents.
fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[open..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Copy of `text` with the given byte ranges cut out.
pub fn remove_spans(text: &str, spans: &[Range<usize>]) -> String {
    let mut spans: Vec<Range<usize>> = spans.to_vec();
    spans.sort_by_key(|s| s.start);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in spans {
        if span.start > cursor {
            out.push_str(&text[cursor..span.start]);
        }
        cursor = cursor.max(span.end);
    }
    if cursor < text.len() {
        out.push_str(&text[cursor..]);
    }
    out
}

/// Display text: action fragments and fences stripped, blank runs collapsed, trimmed.
pub fn clean_text(text_without_blocks: &str) -> String {
    let text = strip_action_fragments(text_without_blocks);
    let text = strip_code_fences(&text);
    BLANK_RUN_RE.replace_all(&text, "\n\n").trim().to_string()
}
