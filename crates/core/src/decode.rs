//! Turning free-form LLM output into an [`AnalysisResult`].

use serde_json::Value;

use crate::types::AnalysisResult;

const REQUIRED_FIELDS: [&str; 2] = ["finalVerdict", "videoSummary"];

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Could not find a JSON object in the model response")]
    Malformed { raw: String },

    #[error("Invalid analysis structure: {0}")]
    InvalidShape(String),
}

/// Pull the first JSON object out of `text`.
///
/// Markdown fences are stripped first. If that doesn't parse, the span from
/// the first `{` to the last `}` is tried.
pub fn extract_json(text: &str) -> Option<Value> {
    let unfenced = strip_fences(text);
    if let Ok(value) = serde_json::from_str::<Value>(unfenced) {
        return Some(value);
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

pub fn decode_analysis(text: &str) -> Result<AnalysisResult, DecodeError> {
    let value = extract_json(text).ok_or_else(|| DecodeError::Malformed {
        raw: text.to_string(),
    })?;
    validate(value)
}

fn validate(value: Value) -> Result<AnalysisResult, DecodeError> {
    let Some(object) = value.as_object() else {
        return Err(DecodeError::InvalidShape(
            "response is not a JSON object".into(),
        ));
    };

    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| object.get(*field).is_none_or(Value::is_null))
        .collect();
    if !missing.is_empty() {
        return Err(DecodeError::InvalidShape(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }

    serde_json::from_value(value).map_err(|err| DecodeError::InvalidShape(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "finalVerdict": { "clarityOfContent": 4, "emotionalImpact": 3.5 },
        "videoSummary": { "overview": "Covers ownership", "positivePoints": ["clear"] },
        "comprehensionScore": 82
    }"#;

    /// Every field present and every number a float, so the decoded result
    /// serializes back to exactly this document.
    const FULL_PAYLOAD: &str = r#"{
        "insights": {
            "studentEngagement": 71.0, "contentQuality": 80.0, "conceptConnectivity": 65.0,
            "clarityOfExplanation": 88.0, "practicalExamples": 60.0, "visualDiagramMentions": 10.0,
            "studentInteraction": 35.0, "educationalDepth": 70.0, "retentionTechniques": 55.0,
            "targetAudience": "Intermediate"
        },
        "finalVerdict": {
            "clarityOfContent": 4.5, "emotionalImpact": 3.0, "videoStructure": 4.0,
            "retentionPower": 3.5, "commercialBalance": 5.0
        },
        "videoSummary": {
            "overview": "Covers ownership",
            "positivePoints": ["clear"],
            "negativePoints": ["fast"],
            "suggestions": ["add diagrams"]
        },
        "topKeywords": [{ "text": "borrow", "value": 9.0 }],
        "comprehensionScore": 82.0,
        "videoTitle": "Ownership 101"
    }"#;

    #[test]
    fn decodes_fenced_json() {
        let text = format!("```json\n{FULL_PAYLOAD}\n```");
        let embedded: Value = serde_json::from_str(FULL_PAYLOAD).unwrap();

        assert_eq!(extract_json(&text), Some(embedded.clone()));

        let result = decode_analysis(&text).unwrap();
        assert_eq!(serde_json::to_value(&result).unwrap(), embedded);
    }

    #[test]
    fn decodes_json_wrapped_in_prose() {
        let text = format!("Here is the analysis you asked for:\n{PAYLOAD}\nLet me know!");

        let result = decode_analysis(&text).unwrap();

        assert_eq!(result.video_summary.positive_points, vec!["clear"]);
    }

    #[test]
    fn missing_required_field_is_invalid_shape() {
        let err = decode_analysis(r#"{"finalVerdict": {}}"#).unwrap_err();

        match err {
            DecodeError::InvalidShape(message) => assert!(message.contains("videoSummary")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_object_is_invalid_shape() {
        let err = decode_analysis("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidShape(_)));
    }

    #[test]
    fn text_without_json_is_malformed() {
        let err = decode_analysis("I cannot analyze this video.").unwrap_err();

        match err {
            DecodeError::Malformed { raw } => assert_eq!(raw, "I cannot analyze this video."),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
