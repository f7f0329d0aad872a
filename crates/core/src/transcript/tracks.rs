use serde::Deserialize;

/// A caption track as listed by the player endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    /// `"asr"` marks auto-generated tracks; manual tracks usually omit it.
    #[serde(default)]
    pub kind: Option<String>,
}

impl CaptionTrack {
    pub fn is_auto_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }

    fn is_english(&self) -> bool {
        self.language_code == "en"
    }

    fn is_english_variant(&self) -> bool {
        self.language_code.starts_with("en")
    }
}

type TrackPredicate = fn(&CaptionTrack) -> bool;

/// Highest priority first.
const TRACK_PRIORITY: [TrackPredicate; 5] = [
    |t: &CaptionTrack| t.is_english() && !t.is_auto_generated(),
    |t: &CaptionTrack| t.is_english() && t.is_auto_generated(),
    |t: &CaptionTrack| t.is_english_variant() && !t.is_auto_generated(),
    |t: &CaptionTrack| t.is_english_variant(),
    |t: &CaptionTrack| !t.is_auto_generated(),
];

/// Picks the track matching the highest-priority predicate, else the first track.
pub fn select_track(tracks: &[CaptionTrack]) -> Option<&CaptionTrack> {
    TRACK_PRIORITY
        .iter()
        .find_map(|predicate| tracks.iter().find(|t| predicate(t)))
        .or_else(|| tracks.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(lang: &str, kind: &str) -> CaptionTrack {
        CaptionTrack {
            base_url: format!("https://example.test/{lang}/{kind}"),
            language_code: lang.to_string(),
            kind: Some(kind.to_string()),
        }
    }

    #[test]
    fn prefers_manual_english() {
        let tracks = vec![track("fr", "asr"), track("en", "asr"), track("en", "manual")];
        assert_eq!(select_track(&tracks), Some(&tracks[2]));
    }

    #[test]
    fn falls_through_the_priority_list() {
        let tracks = vec![track("fr", "asr"), track("en", "asr")];
        assert_eq!(select_track(&tracks), Some(&tracks[1]));

        let tracks = vec![track("en-US", "asr"), track("en-GB", "manual")];
        assert_eq!(select_track(&tracks), Some(&tracks[1]));

        let tracks = vec![track("de", "asr"), track("en-US", "asr")];
        assert_eq!(select_track(&tracks), Some(&tracks[1]));

        let tracks = vec![track("de", "asr"), track("ja", "manual")];
        assert_eq!(select_track(&tracks), Some(&tracks[1]));

        let tracks = vec![track("de", "asr"), track("ja", "asr")];
        assert_eq!(select_track(&tracks), Some(&tracks[0]));
    }

    #[test]
    fn missing_kind_counts_as_manual() {
        let tracks: Vec<CaptionTrack> = serde_json::from_str(
            r#"[{"baseUrl":"u1","languageCode":"en","kind":"asr"},{"baseUrl":"u2","languageCode":"en"}]"#,
        )
        .unwrap();

        assert_eq!(select_track(&tracks).map(|t| t.base_url.as_str()), Some("u2"));
    }

    #[test]
    fn no_tracks_no_selection() {
        assert_eq!(select_track(&[]), None);
    }
}
