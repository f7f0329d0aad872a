use crate::types::{SummaryResult, VideoMetadata};

/// Format seconds as MM:SS, or H:MM:SS past the hour
pub fn format_timestamp(seconds: u64) -> String {
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

/// 1234567 -> "1.2M views"
pub fn format_view_count(views: u64) -> String {
    match views {
        0..=999 => format!("{} views", views),
        // 999_950 and up would round to "1000.0K"
        1_000..=999_949 => format!("{:.1}K views", views as f64 / 1_000.0),
        _ => format!("{:.1}M views", views as f64 / 1_000_000.0),
    }
}

fn format_metadata_line(metadata: &VideoMetadata) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(channel) = &metadata.channel {
        parts.push(format!("**Channel:** {}", channel));
    }
    if let Some(duration) = metadata.duration {
        parts.push(format!("**Duration:** {}", format_timestamp(duration)));
    }
    if let Some(views) = metadata.view_count {
        parts.push(format_view_count(views));
    }
    (!parts.is_empty()).then(|| parts.join(" | "))
}

pub fn format_summary_readable(result: &SummaryResult) -> String {
    let mut output = String::new();
    let title = result.metadata.title.as_deref().unwrap_or("Untitled video");
    output.push_str(&format!("# {}\n\n", title));

    if let Some(line) = format_metadata_line(&result.metadata) {
        output.push_str(&line);
        output.push_str("\n\n");
    }

    if let Some(disclaimer) = &result.disclaimer {
        output.push_str(&format!("> {}\n\n", disclaimer));
    }

    output.push_str("## Summary\n\n");
    for point in &result.summary {
        output.push_str(&format!("• {}\n", point));
    }
    output.push('\n');

    if !result.takeaways.is_empty() {
        output.push_str("## Key takeaways\n\n");
        for (i, takeaway) in result.takeaways.iter().enumerate() {
            output.push_str(&format!("{}. {}\n", i + 1, takeaway));
        }
        output.push('\n');
    }

    let source = if result.from_cache {
        format!("{} (cached)", result.provider.display_name())
    } else {
        result.provider.display_name().to_string()
    };
    output.push_str(&format!("_Generated by {}_\n", source));

    output
}
