//! Transcript retrieval through a fixed language fallback chain.
//!
//! Each stage (preferred language, English, any language) is tried against
//! every configured source before moving on. The first non-empty transcript
//! wins.

mod proxy;
mod supadata;
mod ytdlp;

use std::{fmt, sync::Arc};

use async_trait::async_trait;

pub use proxy::ProxySource;
pub use supadata::SupadataSource;
pub use ytdlp::YtDlpSource;

use crate::{
    config::AppConfig,
    error::{AttemptFailure, ConfigError, SourceError, TranscriptError},
    types::{FetchedTranscript, TranscriptSegment},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageRequest {
    Code(String),
    /// Whatever the source has, no language constraint.
    Any,
}

impl LanguageRequest {
    pub fn code(&self) -> Option<&str> {
        match self {
            LanguageRequest::Code(code) => Some(code),
            LanguageRequest::Any => None,
        }
    }

    pub fn label(&self) -> &str {
        self.code().unwrap_or("auto")
    }
}

impl fmt::Display for LanguageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a single source hands back before the service validates it.
#[derive(Debug, Clone, Default)]
pub struct SourceTranscript {
    pub segments: Vec<TranscriptSegment>,
    /// Language code reported by the source, when it reports one.
    pub language: Option<String>,
}

#[async_trait]
pub trait TranscriptSource: Send + Sync {
    fn id(&self) -> &'static str;

    async fn fetch(
        &self,
        video_id: &str,
        language: &LanguageRequest,
    ) -> Result<SourceTranscript, SourceError>;
}

/// Stage order: preferred, then English unless already preferred, then any.
pub fn fallback_languages(preferred: &str) -> Vec<LanguageRequest> {
    let mut stages = vec![LanguageRequest::Code(preferred.to_string())];
    if !preferred.eq_ignore_ascii_case("en") {
        stages.push(LanguageRequest::Code("en".to_string()));
    }
    stages.push(LanguageRequest::Any);
    stages
}

pub struct TranscriptService {
    sources: Vec<Arc<dyn TranscriptSource>>,
}

impl TranscriptService {
    pub fn new(sources: Vec<Arc<dyn TranscriptSource>>) -> Result<Self, ConfigError> {
        if sources.is_empty() {
            return Err(ConfigError::NoTranscriptSources);
        }
        Ok(Self { sources })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Self::new(sources_from_config(config)?)
    }

    pub fn source_ids(&self) -> Vec<&'static str> {
        self.sources.iter().map(|source| source.id()).collect()
    }

    /// Ordered `(source, language)` attempts, stage-major.
    pub fn plan(&self, preferred: &str) -> Vec<(Arc<dyn TranscriptSource>, LanguageRequest)> {
        fallback_languages(preferred)
            .into_iter()
            .flat_map(|language| {
                self.sources
                    .iter()
                    .map(move |source| (Arc::clone(source), language.clone()))
            })
            .collect()
    }

    pub async fn fetch(
        &self,
        video_id: &str,
        preferred: &str,
    ) -> Result<FetchedTranscript, TranscriptError> {
        let mut attempts = Vec::new();

        for (source, language) in self.plan(preferred) {
            tracing::debug!(video_id, source = source.id(), %language, "trying transcript source");

            let outcome = source
                .fetch(video_id, &language)
                .await
                .and_then(|transcript| {
                    if transcript.segments.iter().all(|seg| seg.text.trim().is_empty()) {
                        Err(SourceError::Empty)
                    } else {
                        Ok(transcript)
                    }
                });

            match outcome {
                Ok(transcript) => {
                    let language_used = transcript
                        .language
                        .filter(|code| !code.is_empty())
                        .unwrap_or_else(|| language.label().to_string());
                    tracing::info!(
                        video_id,
                        source = source.id(),
                        language = %language_used,
                        segments = transcript.segments.len(),
                        "transcript fetched"
                    );
                    return Ok(FetchedTranscript {
                        segments: transcript.segments,
                        language_used,
                        source: source.id(),
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        video_id,
                        source = source.id(),
                        %language,
                        error = %err,
                        "transcript attempt failed"
                    );
                    attempts.push(AttemptFailure {
                        source_id: source.id(),
                        language: language.label().to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        Err(TranscriptError::NotFound {
            video_id: video_id.to_string(),
            attempts,
        })
    }
}

/// Sources in priority order: Supadata, the transcript proxy, then yt-dlp.
pub fn sources_from_config(
    config: &AppConfig,
) -> Result<Vec<Arc<dyn TranscriptSource>>, ConfigError> {
    let settings = &config.transcript;
    let mut sources: Vec<Arc<dyn TranscriptSource>> = Vec::new();

    if let Some(api_key) = &settings.supadata_api_key {
        sources.push(Arc::new(SupadataSource::new(
            &settings.supadata_api_url,
            api_key,
            config.request_timeout,
        )?));
    }
    if let Some(url) = &settings.proxy_url {
        sources.push(Arc::new(ProxySource::new(url, config.request_timeout)?));
    }
    if settings.ytdlp_enabled {
        sources.push(Arc::new(YtDlpSource::new(config.request_timeout)));
    }

    if sources.is_empty() {
        return Err(ConfigError::NoTranscriptSources);
    }
    Ok(sources)
}
