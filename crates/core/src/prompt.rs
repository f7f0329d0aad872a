use crate::types::{VideoId, VideoMetadata};

/// Transcripts are cut to this many characters before prompting.
pub const MAX_TRANSCRIPT_CHARS: usize = 30_000;

pub const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that summarizes YouTube videos accurately and concisely.";

/// Fixed input used when checking providers.
pub const SAMPLE_INPUT: &str = "In this video we walk through setting up a Rust project with cargo, \
    adding dependencies, writing a first unit test and running it. We finish by building a release binary \
    and discussing how the borrow checker catches common memory bugs at compile time.";

pub const METADATA_DISCLAIMER: &str =
    "This summary is based on the video title and description; no transcript was available.";

pub fn plain_prompt(input: &str) -> String {
    format!(
        "Summarize this YouTube video transcript concisely in 2-3 sentences. \
         Focus on the main topic and key points.\n\nTranscript:\n{input}"
    )
}

pub fn structured_prompt(input: &str, has_transcript: bool) -> String {
    if has_transcript {
        format!(
            r#"Summarize this YouTube video transcript.

Respond in EXACTLY this format and nothing else:

SUMMARY:
- <key point>
- <key point>
(4-8 bullet points covering the main content, in the order it is presented)

TAKEAWAYS:
1. <actionable takeaway>
2. <actionable takeaway>
3. <actionable takeaway>

Transcript:
{input}"#
        )
    } else {
        format!(
            r#"No transcript is available for this YouTube video. Summarize what the video is most likely about using only the metadata below. Do not invent details that the metadata does not support.

Respond in EXACTLY this format and nothing else:

DISCLAIMER: {METADATA_DISCLAIMER}

SUMMARY:
- <key point>
(2-5 bullet points)

TAKEAWAYS:
1. <takeaway>
2. <takeaway>
3. <takeaway>

Video metadata:
{input}"#
        )
    }
}

/// Cuts the transcript on a char boundary.
pub fn prepare_transcript(text: &str) -> String {
    match text.char_indices().nth(MAX_TRANSCRIPT_CHARS) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Input text for the metadata-only prompt.
pub fn metadata_input(video_id: &VideoId, metadata: &VideoMetadata) -> String {
    let mut lines = vec![format!("Video ID: {video_id}")];

    if let Some(title) = &metadata.title {
        lines.push(format!("Title: {title}"));
    }
    if let Some(channel) = &metadata.channel {
        lines.push(format!("Channel: {channel}"));
    }
    if let Some(description) = &metadata.description {
        lines.push(format!("Description: {description}"));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_transcripts_are_cut() {
        let text = "é".repeat(MAX_TRANSCRIPT_CHARS + 10);
        let prepared = prepare_transcript(&text);

        assert_eq!(prepared.chars().count(), MAX_TRANSCRIPT_CHARS + 3);
        assert!(prepared.ends_with("..."));
        assert_eq!(prepare_transcript("short"), "short");
    }

    #[test]
    fn metadata_input_skips_missing_fields() {
        let metadata = VideoMetadata {
            title: Some("Rust in 100 seconds".into()),
            description: Some("A quick tour".into()),
            ..Default::default()
        };

        assert_eq!(
            metadata_input(&VideoId::new("abc123"), &metadata),
            "Video ID: abc123\nTitle: Rust in 100 seconds\nDescription: A quick tour"
        );
    }

    #[test]
    fn structured_prompt_variants_differ_on_disclaimer() {
        assert!(!structured_prompt("t", true).contains("DISCLAIMER:"));
        assert!(structured_prompt("t", false).contains("DISCLAIMER:"));
    }
}
