//! Video metadata from YouTube's oEmbed endpoint (no API key needed).

use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_OEMBED_URL: &str = "https://www.youtube.com/oembed";

#[derive(Debug, Deserialize)]
struct OEmbed {
    title: Option<String>,
}

pub struct VideoInfoClient {
    http: reqwest::Client,
    oembed_url: String,
}

impl VideoInfoClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            oembed_url: DEFAULT_OEMBED_URL.to_string(),
        })
    }

    pub fn with_oembed_url(mut self, url: impl Into<String>) -> Self {
        self.oembed_url = url.into();
        self
    }

    /// Video title, or `None` when the lookup fails for any reason.
    /// A missing title never blocks the analysis.
    pub async fn title(&self, video_id: &str) -> Option<String> {
        match self.fetch_title(video_id).await {
            Ok(title) => title.filter(|title| !title.trim().is_empty()),
            Err(err) => {
                tracing::debug!(video_id, error = %err, "oEmbed title lookup failed");
                None
            }
        }
    }

    async fn fetch_title(&self, video_id: &str) -> Result<Option<String>, reqwest::Error> {
        let watch_url = format!("https://www.youtube.com/watch?v={video_id}");
        let body: OEmbed = self
            .http
            .get(&self.oembed_url)
            .query(&[("url", watch_url.as_str()), ("format", "json")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body.title)
    }
}
