use crate::types::{AnalysisResult, TranscriptSegment};

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

/// Format transcript segments with timestamps
pub fn format_transcript_with_timestamps(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|seg| format!("[{}] {}", format_timestamp(seg.start_offset), seg.text.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 1-5 rating as filled/empty stars, rounded to the nearest star.
fn stars(rating: f64) -> String {
    let filled = rating.round().clamp(0.0, 5.0) as usize;
    format!("{}{} {:.1}", "★".repeat(filled), "☆".repeat(5 - filled), rating)
}

fn push_list(output: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    output.push_str(&format!("## {}\n\n", heading));
    for item in items {
        output.push_str(&format!("• {}\n", item));
    }
    output.push('\n');
}

pub fn format_report_readable(report: &AnalysisResult) -> String {
    let mut output = String::new();

    let title = report.video_title().unwrap_or("Video analysis");
    output.push_str(&format!("# {}\n\n", title));

    if let Some(score) = report.comprehension_score {
        output.push_str(&format!("**Comprehension score:** {:.0}/100", score));
        if let Some(insights) = &report.insights {
            output.push_str(&format!(" | **Audience:** {:?}", insights.target_audience));
        }
        output.push_str("\n\n");
    }

    output.push_str("## Summary\n\n");
    output.push_str(&report.video_summary.overview);
    output.push_str("\n\n");

    let verdict = &report.final_verdict;
    output.push_str("## Final verdict\n\n");
    for (label, rating) in [
        ("Clarity of content", verdict.clarity_of_content),
        ("Emotional impact", verdict.emotional_impact),
        ("Video structure", verdict.video_structure),
        ("Retention power", verdict.retention_power),
        ("Commercial balance", verdict.commercial_balance),
    ] {
        output.push_str(&format!("{:<20} {}\n", label, stars(rating)));
    }
    output.push('\n');

    push_list(&mut output, "Strengths", &report.video_summary.positive_points);
    push_list(&mut output, "Weaknesses", &report.video_summary.negative_points);
    push_list(&mut output, "Suggestions", &report.video_summary.suggestions);

    if let Some(keywords) = report.top_keywords.as_ref().filter(|k| !k.is_empty()) {
        let keywords = keywords
            .iter()
            .map(|keyword| keyword.text.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        output.push_str(&format!("**Keywords:** {}\n", keywords));
    }

    output
}
