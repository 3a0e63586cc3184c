use std::sync::LazyLock;

use regex::Regex;

static BARE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid video id regex"));

static URL_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:youtu\.be/|v/|u/\w/|embed/|shorts/|watch\?v=|&v=)([A-Za-z0-9_-]{11})")
        .expect("valid video url regex")
});

/// Accepts a bare 11-character video id or any common YouTube URL form.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if BARE_ID.is_match(input) {
        return Some(input.to_string());
    }

    URL_ID
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|id| id.as_str().to_string())
}
