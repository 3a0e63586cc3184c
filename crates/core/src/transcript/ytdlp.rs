use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::{fs, process::Command};

use super::{LanguageRequest, SourceTranscript, TranscriptSource};
use crate::{error::SourceError, paths::subtitles_dir, types::TranscriptSegment};

#[derive(Debug, Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: f64,
    #[serde(default)]
    d_duration_ms: f64,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Parse YouTube's json3 caption format into segments, skipping
/// events that carry no text (window setup, line breaks).
pub(crate) fn parse_json3(raw: &str) -> Result<Vec<TranscriptSegment>, SourceError> {
    let doc: Json3 = serde_json::from_str(raw)?;

    Ok(doc
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs.iter().map(|seg| seg.utf8.as_str()).collect();
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            (!text.is_empty()).then(|| {
                TranscriptSegment::new(text, event.t_start_ms / 1000.0, event.d_duration_ms / 1000.0)
            })
        })
        .collect())
}

/// Language code from a subtitle file named `<id>.<lang>.json3`.
fn language_from_file_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let (_, lang) = stem.rsplit_once('.')?;
    Some(lang.trim_end_matches("-orig").to_string())
}

/// Caption download through the `yt-dlp` binary.
pub struct YtDlpSource {
    timeout: Duration,
}

impl YtDlpSource {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn download(
        &self,
        video_id: &str,
        language: &LanguageRequest,
        dir: &Path,
    ) -> Result<(), SourceError> {
        let output_template = dir.join("%(id)s.%(ext)s");
        let mut command = Command::new("yt-dlp");
        command
            .arg("--skip-download")
            .arg("--no-warnings")
            .arg("--sub-format")
            .arg("json3")
            .arg("-o")
            .arg(&output_template);

        match language.code() {
            Some(code) => {
                command
                    .arg("--write-subs")
                    .arg("--write-auto-subs")
                    .arg("--sub-langs")
                    .arg(format!("{code},{code}-orig"));
            }
            None => {
                command.arg("--write-subs").arg("--sub-langs").arg("all,-live_chat");
            }
        }

        command
            .arg(format!("https://www.youtube.com/watch?v={video_id}"))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| SourceError::Subprocess {
                reason: format!("timed out after {}s", self.timeout.as_secs()),
            })??;

        if !output.status.success() {
            return Err(SourceError::Subprocess {
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    async fn read_subtitles(
        &self,
        dir: &Path,
        language: &LanguageRequest,
    ) -> Result<SourceTranscript, SourceError> {
        let mut files: Vec<PathBuf> = Vec::new();
        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json3") {
                files.push(path);
            }
        }
        files.sort();

        // Prefer the plain language track over the `-orig` auto track
        let Some(file) = files
            .iter()
            .min_by_key(|path| path.to_string_lossy().contains("-orig."))
        else {
            return Err(SourceError::Unavailable {
                language: language.label().to_string(),
            });
        };

        let raw = fs::read_to_string(file).await?;
        Ok(SourceTranscript {
            segments: parse_json3(&raw)?,
            language: language_from_file_name(file),
        })
    }
}

#[async_trait]
impl TranscriptSource for YtDlpSource {
    fn id(&self) -> &'static str {
        "yt-dlp"
    }

    async fn fetch(
        &self,
        video_id: &str,
        language: &LanguageRequest,
    ) -> Result<SourceTranscript, SourceError> {
        let dir = subtitles_dir().join(format!("{}-{}", video_id, uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).await?;

        let result = match self.download(video_id, language, &dir).await {
            Ok(()) => self.read_subtitles(&dir, language).await,
            Err(err) => Err(err),
        };

        if let Err(err) = fs::remove_dir_all(&dir).await {
            tracing::debug!(dir = %dir.display(), error = %err, "failed to remove subtitle dir");
        }
        result
    }
}
