use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{LanguageRequest, SourceTranscript, TranscriptSource};
use crate::{error::SourceError, types::TranscriptSegment};

#[derive(Debug, Deserialize)]
struct SupadataResponse {
    #[serde(default)]
    content: Vec<SupadataChunk>,
    lang: Option<String>,
}

/// Offsets and durations are in milliseconds.
#[derive(Debug, Deserialize)]
struct SupadataChunk {
    text: String,
    #[serde(default)]
    offset: f64,
    #[serde(default)]
    duration: f64,
    lang: Option<String>,
}

/// Hosted transcript API at supadata.ai.
pub struct SupadataSource {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl SupadataSource {
    pub fn new(api_url: &str, api_key: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl TranscriptSource for SupadataSource {
    fn id(&self) -> &'static str {
        "supadata"
    }

    async fn fetch(
        &self,
        video_id: &str,
        language: &LanguageRequest,
    ) -> Result<SourceTranscript, SourceError> {
        let mut request = self
            .http
            .get(&self.api_url)
            .header("x-api-key", &self.api_key)
            .query(&[("videoId", video_id)]);
        if let Some(code) = language.code() {
            request = request.query(&[("lang", code)]);
        }

        let response = request.send().await?;
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

        let body: SupadataResponse = response.json().await?;
        let chunk_lang = body.content.iter().find_map(|chunk| chunk.lang.clone());
        let segments = body
            .content
            .into_iter()
            .map(|chunk| {
                TranscriptSegment::new(chunk.text, chunk.offset / 1000.0, chunk.duration / 1000.0)
            })
            .collect();

        Ok(SourceTranscript {
            segments,
            language: body.lang.or(chunk_lang),
        })
    }
}
