//! Tubescope Core Library
//!
//! Transcript retrieval through a language fallback chain, LLM-powered
//! analysis of the transcript with an in-memory TTL cache, and the small
//! utilities both rely on.

pub mod analysis;
pub mod cache;
pub mod config;
pub mod decode;
pub mod error;
pub mod format;
pub mod key;
pub mod paths;
pub mod prompt;
pub mod provider;
pub mod report;
pub mod retry;
pub mod transcript;
pub mod types;
pub mod video_id;
pub mod video_info;

// Re-export commonly used items at crate root
pub use analysis::{Analysis, AnalysisRequest, AnalysisService, AnalysisSettings};
pub use cache::TtlCache;
pub use config::AppConfig;
pub use decode::{DecodeError, decode_analysis};
pub use error::{
    AnalysisError, AttemptFailure, ConfigError, Result, SourceError, TranscriptError,
    TubescopeError,
};
pub use format::{format_report_readable, format_timestamp, format_transcript_with_timestamps};
pub use key::{KeyEncoding, hash};
pub use provider::{LlmClient, Provider, ProviderConfig, ProviderError, TextGenerator};
pub use report::{load_report, report_path, save_report};
pub use retry::{RetryPolicy, with_retry, with_retry_if};
pub use transcript::{LanguageRequest, TranscriptService, TranscriptSource};
pub use types::{AnalysisResult, FetchedTranscript, TranscriptSegment};
pub use video_id::extract_video_id;
pub use video_info::VideoInfoClient;
