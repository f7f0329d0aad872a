use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::provider::ProviderKind;

pub const MAX_TAKEAWAYS: usize = 3;

static VIDEO_URL_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"[?&]v=([A-Za-z0-9_-]+)").expect("valid watch regex"),
        Regex::new(r"/shorts/([A-Za-z0-9_-]+)").expect("valid shorts regex"),
        Regex::new(r"youtu\.be/([A-Za-z0-9_-]+)").expect("valid short link regex"),
    ]
});

static BARE_VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid video id regex"));

/// Opaque video token. Cache key and input to extraction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Accepts a bare id or a `watch?v=`, `/shorts/` or `youtu.be/` URL.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        if BARE_VIDEO_ID.is_match(input) {
            return Some(Self::new(input));
        }

        if !input.contains("youtube.com") && !input.contains("youtu.be") {
            return None;
        }

        VIDEO_URL_PATTERNS
            .iter()
            .find_map(|re| re.captures(input))
            .map(|caps| Self::new(&caps[1]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptSource {
    Innertube,
    PageScrape,
    None,
}

impl fmt::Display for TranscriptSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptSource::Innertube => write!(f, "innertube"),
            TranscriptSource::PageScrape => write!(f, "page_scrape"),
            TranscriptSource::None => write!(f, "none"),
        }
    }
}

/// Outcome of transcript extraction. `available` holds iff `text` is non-empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TranscriptResult {
    text: Option<String>,
    available: bool,
    source: TranscriptSource,
    error: Option<String>,
}

impl TranscriptResult {
    pub fn found(text: impl Into<String>, source: TranscriptSource) -> Self {
        let text = text.into();
        if text.trim().is_empty() {
            return Self::unavailable(Some("transcript was empty".to_string()));
        }

        Self {
            text: Some(text),
            available: true,
            source,
            error: None,
        }
    }

    pub fn unavailable(error: Option<String>) -> Self {
        Self {
            text: None,
            available: false,
            source: TranscriptSource::None,
            error,
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn available(&self) -> bool {
        self.available
    }

    pub fn source(&self) -> TranscriptSource {
        self.source
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoMetadata {
    pub title: Option<String>,
    pub channel: Option<String>,
    pub description: Option<String>,
    /// Seconds.
    pub duration: Option<u64>,
    pub view_count: Option<u64>,
}

/// Summary as it arrives at a boundary: free text or a bullet list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SummaryBody {
    Text(String),
    Bullets(Vec<String>),
}

impl SummaryBody {
    /// Canonical form: a list of non-empty, trimmed points.
    pub fn into_bullets(self) -> Vec<String> {
        let items = match self {
            SummaryBody::Text(text) => vec![text],
            SummaryBody::Bullets(items) => items,
        };

        items
            .into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    }
}

fn deserialize_summary_body<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(SummaryBody::deserialize(deserializer)?.into_bullets())
}

fn deserialize_takeaways<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut takeaways = Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default();
    takeaways.truncate(MAX_TAKEAWAYS);
    Ok(takeaways)
}

/// The unit persisted by the cache and returned to callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResult {
    #[serde(deserialize_with = "deserialize_summary_body")]
    pub summary: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_takeaways")]
    pub takeaways: Vec<String>,
    #[serde(default)]
    pub disclaimer: Option<String>,
    pub provider: ProviderKind,
    #[serde(default)]
    pub metadata: VideoMetadata,
    #[serde(default)]
    pub has_transcript: bool,
    #[serde(default)]
    pub from_cache: bool,
}

impl SummaryResult {
    pub fn new(
        summary: SummaryBody,
        mut takeaways: Vec<String>,
        disclaimer: Option<String>,
        provider: ProviderKind,
        metadata: VideoMetadata,
        has_transcript: bool,
    ) -> Self {
        takeaways.truncate(MAX_TAKEAWAYS);
        Self {
            summary: summary.into_bullets(),
            takeaways,
            disclaimer,
            provider,
            metadata,
            has_transcript,
            from_cache: false,
        }
    }
}
