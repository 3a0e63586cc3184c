use std::path::PathBuf;

use thiserror::Error;

use crate::{decode::DecodeError, provider::ProviderError};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("No transcript source is enabled (set SUPADATA_API_KEY, TRANSCRIPT_PROXY_URL or YTDLP_ENABLED)")]
    NoTranscriptSources,

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Failure of a single transcript source for a single language.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{source_id} returned {status}: {body}")]
    Status {
        source_id: &'static str,
        status: u16,
        body: String,
    },

    #[error("No captions in {language}")]
    Unavailable { language: String },

    #[error("Transcript is empty")]
    Empty,

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("yt-dlp failed: {reason}")]
    Subprocess { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct AttemptFailure {
    pub source_id: &'static str,
    pub language: String,
    pub reason: String,
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]: {}", self.source_id, self.language, self.reason)
    }
}

#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("No transcript available for {video_id}: {}", last_reason(.attempts))]
    NotFound {
        video_id: String,
        attempts: Vec<AttemptFailure>,
    },
}

impl TranscriptError {
    pub fn attempts(&self) -> &[AttemptFailure] {
        match self {
            TranscriptError::NotFound { attempts, .. } => attempts,
        }
    }
}

fn last_reason(attempts: &[AttemptFailure]) -> String {
    attempts
        .last()
        .map(|attempt| attempt.reason.clone())
        .unwrap_or_else(|| "no transcript source was tried".to_string())
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Errors from saving and loading reports on disk.
#[derive(Error, Debug)]
pub enum TubescopeError {
    #[error("Failed to write report to {path}: {source}")]
    ReportWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TubescopeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_reports_last_attempt() {
        let err = TranscriptError::NotFound {
            video_id: "dQw4w9WgXcQ".into(),
            attempts: vec![
                AttemptFailure {
                    source_id: "supadata",
                    language: "hi".into(),
                    reason: "No captions in hi".into(),
                },
                AttemptFailure {
                    source_id: "supadata",
                    language: "auto".into(),
                    reason: "Transcript is empty".into(),
                },
            ],
        };

        assert_eq!(
            err.to_string(),
            "No transcript available for dQw4w9WgXcQ: Transcript is empty"
        );
        assert_eq!(err.attempts().len(), 2);
    }

    #[test]
    fn not_found_without_attempts() {
        let err = TranscriptError::NotFound {
            video_id: "dQw4w9WgXcQ".into(),
            attempts: Vec::new(),
        };

        assert!(err.to_string().ends_with("no transcript source was tried"));
    }
}
