//! Caption payload parsing: the `json3` segment list and the timed-text XML markup.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

static TEXT_NODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<text[^>]*>(.*?)</text>").expect("valid text node regex"));

#[derive(Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Deserialize)]
struct Json3Event {
    #[serde(default)]
    segs: Vec<Json3Segment>,
}

#[derive(Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// Plain text from a `fmt=json3` payload; `None` if it is malformed or holds no text.
pub fn parse_json3(body: &str) -> Option<String> {
    let payload: Json3 = serde_json::from_str(body).ok()?;

    let pieces = payload.events.iter().map(|event| {
        event
            .segs
            .iter()
            .map(|seg| seg.utf8.as_str())
            .collect::<String>()
    });

    join_pieces(pieces)
}

/// Plain text from timed-text XML (`<text start=".." dur="..">...</text>` nodes).
pub fn parse_timedtext_xml(body: &str) -> Option<String> {
    let pieces = TEXT_NODE_RE
        .captures_iter(body)
        .map(|caps| unescape_xml(&caps[1]));

    join_pieces(pieces)
}

fn join_pieces(pieces: impl Iterator<Item = String>) -> Option<String> {
    let text = pieces
        .map(|piece| collapse_whitespace(&piece))
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    (!text.is_empty()).then_some(text)
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Unescapes the five standard XML entities. `&amp;` goes last so `&amp;lt;` stays `&lt;`.
pub fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
