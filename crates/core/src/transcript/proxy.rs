use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use super::{LanguageRequest, SourceTranscript, TranscriptSource};
use crate::{error::SourceError, types::TranscriptSegment};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProxySegment {
    text: String,
    #[serde(default, alias = "start", alias = "offset")]
    start_offset: f64,
    #[serde(default)]
    duration: f64,
}

/// The helper answers either with timed segments or with plain text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProxyBody {
    Segments {
        segments: Vec<ProxySegment>,
        language: Option<String>,
    },
    Text {
        transcript: String,
        language: Option<String>,
    },
}

/// External transcript helper service reached over HTTP.
pub struct ProxySource {
    http: reqwest::Client,
    url: String,
}

impl ProxySource {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl TranscriptSource for ProxySource {
    fn id(&self) -> &'static str {
        "proxy"
    }

    async fn fetch(
        &self,
        video_id: &str,
        language: &LanguageRequest,
    ) -> Result<SourceTranscript, SourceError> {
        let response = self
            .http
            .post(&self.url)
            .json(&json!({
                "videoId": video_id,
                "language": language.code(),
            }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SourceError::Unavailable {
                language: language.label().to_string(),
            });
        }
        if !status.is_success() {
            return Err(SourceError::Status {
                source_id: self.id(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: ProxyBody = response
            .json()
            .await
            .map_err(|err| SourceError::InvalidResponse(err.to_string()))?;

        Ok(match body {
            ProxyBody::Segments { segments, language } => SourceTranscript {
                segments: segments
                    .into_iter()
                    .map(|seg| TranscriptSegment::new(seg.text, seg.start_offset, seg.duration))
                    .collect(),
                language,
            },
            // Untimed text: one segment per line
            ProxyBody::Text {
                transcript,
                language,
            } => SourceTranscript {
                segments: transcript
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(|line| TranscriptSegment::new(line, 0.0, 0.0))
                    .collect(),
                language,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn source(server: &MockServer) -> ProxySource {
        ProxySource::new(&format!("{}/api/yt_transcript", server.uri()), Duration::from_secs(5))
            .unwrap()
    }

    #[tokio::test]
    async fn plain_text_is_split_into_lines() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({ "videoId": "dQw4w9WgXcQ", "language": "hi" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "transcript": "first line\n\nsecond line\n" })),
            )
            .mount(&server)
            .await;

        let transcript = source(&server)
            .fetch("dQw4w9WgXcQ", &LanguageRequest::Code("hi".into()))
            .await
            .unwrap();

        let texts: Vec<&str> = transcript.segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["first line", "second line"]);
        assert_eq!(transcript.language, None);
    }

    #[tokio::test]
    async fn timed_segments_are_kept() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({ "videoId": "dQw4w9WgXcQ", "language": null })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "segments": [{ "text": "hola", "start": 2.5, "duration": 1.0 }],
                "language": "es"
            })))
            .mount(&server)
            .await;

        let transcript = source(&server)
            .fetch("dQw4w9WgXcQ", &LanguageRequest::Any)
            .await
            .unwrap();

        assert_eq!(transcript.segments, vec![TranscriptSegment::new("hola", 2.5, 1.0)]);
        assert_eq!(transcript.language.as_deref(), Some("es"));
    }

    #[tokio::test]
    async fn unexpected_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "nope" })))
            .mount(&server)
            .await;

        let err = source(&server)
            .fetch("dQw4w9WgXcQ", &LanguageRequest::Any)
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::InvalidResponse(_)));
    }
}
