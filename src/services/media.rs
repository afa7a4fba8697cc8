//! YouTube playback
//!
//! Searches YouTube for the query and opens the first video in the default
//! browser. Nothing reports back whether playback actually started.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use super::MediaPlayer;
use crate::{Error, Result};

const SEARCH_URL: &str = "https://www.youtube.com/results";
const WATCH_URL: &str = "https://www.youtube.com/watch";

/// Video ids are 11 URL-safe base64 characters
static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""videoId":"([A-Za-z0-9_-]{11})""#).expect("video id pattern is valid")
});

/// Plays the top YouTube search result in the browser
pub struct YouTubePlayer {
    client: reqwest::Client,
}

impl YouTubePlayer {
    /// Create a new player
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::Http)?;
        Ok(Self { client })
    }

    /// Resolve a free-form query to a watch URL
    async fn watch_url(&self, query: &str) -> Result<url::Url> {
        let response = self
            .client
            .get(SEARCH_URL)
            .query(&[("search_query", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Media(format!("YouTube search error {status}")));
        }

        let body = response.text().await?;
        let id = first_video_id(&body)
            .ok_or_else(|| Error::Media(format!("no video found for {query:?}")))?;

        url::Url::parse_with_params(WATCH_URL, &[("v", id)])
            .map_err(|e| Error::Media(e.to_string()))
    }
}

#[async_trait]
impl MediaPlayer for YouTubePlayer {
    async fn play(&self, query: &str) -> Result<()> {
        let url = self.watch_url(query).await?;
        tracing::info!(query, url = %url, "opening video");

        open::that_detached(url.as_str())
            .map_err(|e| Error::Media(format!("failed to open browser: {e}")))
    }
}

/// Extract the first video id from a YouTube results page
#[must_use]
pub fn first_video_id(html: &str) -> Option<&str> {
    VIDEO_ID
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}
