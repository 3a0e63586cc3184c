use std::path::PathBuf;

use crate::provider::Provider;

pub fn root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("tubescope")
}

/// Scratch space for yt-dlp subtitle downloads.
pub fn subtitles_dir() -> PathBuf {
    root_cache_dir().join("subtitles")
}

pub fn reports_dir() -> PathBuf {
    root_cache_dir().join("reports")
}

/// Get the path for a saved report file (provider and language aware)
pub fn report_path(video_id: &str, provider: Provider, lang: &str) -> PathBuf {
    reports_dir().join(format!("{}_{}_{}.json", video_id, provider.id(), lang))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_path_includes_provider_and_language() {
        let path = report_path("dQw4w9WgXcQ", Provider::Openai, "en");

        assert!(path.starts_with(root_cache_dir()));
        assert_eq!(
            path.file_name().and_then(|name| name.to_str()),
            Some("dQw4w9WgXcQ_openai_en.json")
        );
    }
}
