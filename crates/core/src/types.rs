use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

/// One timed caption line, in the order the source produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSegment {
    pub text: String,
    /// Seconds from the start of the video
    pub start_offset: f64,
    /// Seconds
    pub duration: f64,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, start_offset: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start_offset,
            duration,
        }
    }

    pub fn end(&self) -> f64 {
        self.start_offset + self.duration
    }
}

/// Transcript returned by the first successful source in the fallback chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchedTranscript {
    pub segments: Vec<TranscriptSegment>,
    pub language_used: String,
    pub source: &'static str,
}

impl FetchedTranscript {
    /// Flat transcript: segment texts in source order, space-joined.
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|segment| segment.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn duration_seconds(&self) -> f64 {
        self.segments.last().map(TranscriptSegment::end).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinalVerdict {
    pub clarity_of_content: f64,
    pub emotional_impact: f64,
    pub video_structure: f64,
    pub retention_power: f64,
    pub commercial_balance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoSummary {
    pub overview: String,
    pub positive_points: Vec<String>,
    pub negative_points: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetAudience {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

/// Teaching-quality scores, each 0-100.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub student_engagement: f64,
    pub content_quality: f64,
    pub concept_connectivity: f64,
    pub clarity_of_explanation: f64,
    pub practical_examples: f64,
    pub visual_diagram_mentions: f64,
    pub student_interaction: f64,
    pub educational_depth: f64,
    pub retention_techniques: f64,
    pub target_audience: TargetAudience,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub text: String,
    pub value: f64,
}

/// Parsed LLM analysis. `final_verdict` and `video_summary` are mandatory;
/// the optional sections are dropped when the provider returns them
/// malformed, and unknown top-level fields are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub final_verdict: FinalVerdict,
    pub video_summary: VideoSummary,

    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub insights: Option<Insights>,

    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub top_keywords: Option<Vec<Keyword>>,

    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub comprehension_score: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalysisResult {
    pub fn video_title(&self) -> Option<&str> {
        self.extra.get("videoTitle").and_then(Value::as_str)
    }

    /// Stamp a known title, replacing whatever the provider put there.
    pub fn set_video_title(&mut self, title: impl Into<String>) {
        self.extra
            .insert("videoTitle".to_string(), Value::String(title.into()));
    }
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn transcript_text_is_space_joined_in_source_order() {
        let transcript = FetchedTranscript {
            segments: vec![
                TranscriptSegment::new("hello", 0.0, 1.5),
                TranscriptSegment::new("world", 1.5, 2.0),
            ],
            language_used: "en".into(),
            source: "stub",
        };

        assert_eq!(transcript.text(), "hello world");
        assert_eq!(transcript.duration_seconds(), 3.5);
    }

    #[test]
    fn malformed_optional_sections_are_dropped() {
        let result: AnalysisResult = serde_json::from_value(json!({
            "finalVerdict": { "clarityOfContent": 4.5 },
            "videoSummary": { "overview": "Solid intro" },
            "insights": "not an object",
            "topKeywords": [{ "text": "rust", "value": 12 }],
            "videoTitle": "Intro to Rust"
        }))
        .unwrap();

        assert_eq!(result.final_verdict.clarity_of_content, 4.5);
        assert_eq!(result.final_verdict.emotional_impact, 0.0);
        assert!(result.insights.is_none());
        assert_eq!(result.top_keywords.as_ref().map(Vec::len), Some(1));
        assert_eq!(result.extra.get("videoTitle"), Some(&json!("Intro to Rust")));
    }

    #[test]
    fn stamped_title_is_serialized_at_the_top_level() {
        let mut result: AnalysisResult = serde_json::from_value(json!({
            "finalVerdict": {},
            "videoSummary": { "overview": "x" },
            "videoTitle": "guessed by the model"
        }))
        .unwrap();

        result.set_video_title("Ownership in Rust");

        assert_eq!(result.video_title(), Some("Ownership in Rust"));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["videoTitle"], json!("Ownership in Rust"));
    }

    #[test]
    fn serializes_back_to_camel_case() {
        let result: AnalysisResult = serde_json::from_value(json!({
            "finalVerdict": {},
            "videoSummary": { "overview": "x", "positivePoints": ["a"] },
            "comprehensionScore": 70
        }))
        .unwrap();

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["videoSummary"]["positivePoints"], json!(["a"]));
        assert_eq!(value["comprehensionScore"], json!(70.0));
        assert!(value.get("insights").is_none());
    }
}
