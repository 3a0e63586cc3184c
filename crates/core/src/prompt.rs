/// Prefix of `text` holding at most `limit` chars, cut on a char boundary.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn build_analysis_prompt(transcript: &str, video_title: Option<&str>, char_limit: usize) -> String {
    let transcript = truncate_chars(transcript, char_limit);
    let title_line = video_title
        .map(|title| format!("Video Title: \"{}\"\n", title))
        .unwrap_or_default();

    format!(
        r#"You are an expert educational video analyst. Analyze this educational video transcript and provide detailed insights. Return ONLY valid JSON in this exact format:

{{
  "insights": {{
    "studentEngagement": number (0-100),
    "contentQuality": number (0-100),
    "conceptConnectivity": number (0-100),
    "clarityOfExplanation": number (0-100),
    "practicalExamples": number (0-100),
    "visualDiagramMentions": number (0-100),
    "studentInteraction": number (0-100),
    "educationalDepth": number (0-100),
    "retentionTechniques": number (0-100),
    "targetAudience": "Beginner|Intermediate|Advanced"
  }},
  "finalVerdict": {{
    "clarityOfContent": number (1-5 stars, decimal allowed),
    "emotionalImpact": number (1-5 stars, decimal allowed),
    "videoStructure": number (1-5 stars, decimal allowed),
    "retentionPower": number (1-5 stars, decimal allowed),
    "commercialBalance": number (1-5 stars, decimal allowed)
  }},
  "videoSummary": {{
    "overview": "2-3 sentence summary of the video content and teaching approach",
    "positivePoints": ["strength 1", "strength 2", "strength 3"],
    "negativePoints": ["weakness 1", "weakness 2"],
    "suggestions": ["improvement 1", "improvement 2", "improvement 3", "improvement 4", "improvement 5"]
  }},
  "topKeywords": [{{"text": "keyword", "value": frequency}}],
  "comprehensionScore": number (0-100)
}}

Suggestions should be actionable for teachers and focus on content quality, retention and engagement.

{title_line}Transcript:
"""
{transcript}
""""#
    )
}
