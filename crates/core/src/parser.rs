//! Deterministic parser for the structured summary format:
//!
//! ```text
//! DISCLAIMER: optional single line
//! SUMMARY:
//! - bullet
//! TAKEAWAYS:
//! 1. takeaway
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::types::MAX_TAKEAWAYS;

pub const MAX_SUMMARY_POINTS: usize = 8;

static DISCLAIMER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*DISCLAIMER:[ \t]*(.*)$").expect("valid disclaimer regex")
});

static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)SUMMARY:\s*(.*?)(?:TAKEAWAYS:|\z)").expect("valid summary regex")
});

static TAKEAWAYS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)TAKEAWAYS:\s*(.*)\z").expect("valid takeaways regex"));

static TAKEAWAYS_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)TAKEAWAYS:").expect("valid takeaways marker regex"));

static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*•]\s+(.+)$").expect("valid bullet regex"));

static NUMBERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s*(.+)$").expect("valid numbered regex"));

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParsedSummary {
    pub summary: Vec<String>,
    pub takeaways: Vec<String>,
    pub disclaimer: Option<String>,
    pub has_transcript: bool,
}

pub fn parse(raw: &str, has_transcript: bool) -> ParsedSummary {
    ParsedSummary {
        summary: summary_points(raw),
        takeaways: takeaways(raw),
        disclaimer: disclaimer(raw),
        has_transcript,
    }
}

/// `raw` up to the first `TAKEAWAYS:` marker, trimmed.
pub fn before_takeaways(raw: &str) -> &str {
    TAKEAWAYS_MARKER_RE
        .find(raw)
        .map_or(raw, |marker| &raw[..marker.start()])
        .trim()
}

fn disclaimer(raw: &str) -> Option<String> {
    DISCLAIMER_RE
        .captures(raw)
        .map(|caps| caps[1].trim().to_string())
        .filter(|text| !text.is_empty())
}

fn summary_points(raw: &str) -> Vec<String> {
    let Some(caps) = SUMMARY_RE.captures(raw) else {
        return Vec::new();
    };

    matching_lines(&caps[1], &BULLET_RE, MAX_SUMMARY_POINTS)
}

fn takeaways(raw: &str) -> Vec<String> {
    let Some(caps) = TAKEAWAYS_RE.captures(raw) else {
        return Vec::new();
    };

    matching_lines(&caps[1], &NUMBERED_RE, MAX_TAKEAWAYS)
}

fn matching_lines(block: &str, pattern: &Regex, limit: usize) -> Vec<String> {
    block
        .lines()
        .filter_map(|line| pattern.captures(line.trim()))
        .map(|caps| caps[1].trim().to_string())
        .filter(|item| !item.is_empty())
        .take(limit)
        .collect()
}
