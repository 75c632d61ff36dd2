//! Playback Status Provider client.

use auxroom_proto::playback::NowPlayingResponse;
use url::Url;

/// HTTP client for the now-playing endpoint.
#[derive(Debug, Clone)]
pub struct PlaybackClient {
    http: reqwest::Client,
    url: Url,
}

impl PlaybackClient {
    /// Path of the now-playing endpoint, relative to the HTTP base.
    pub const NOW_PLAYING_PATH: &'static str = "playback/now-playing";

    /// Create a client against the given base URL.
    ///
    /// # Errors
    ///
    /// If the endpoint URL cannot be constructed from the base.
    pub fn new(http: reqwest::Client, base: &Url) -> Result<Self, url::ParseError> {
        Ok(Self { http, url: base.join(Self::NOW_PLAYING_PATH)? })
    }

    /// Fetch one playback snapshot.
    ///
    /// Failures are expected under slow or flaky networks; the caller keeps
    /// the previous snapshot and lets the staleness threshold do its work.
    pub async fn fetch(&self) -> Result<NowPlayingResponse, reqwest::Error> {
        self.http.get(self.url.clone()).send().await?.error_for_status()?.json().await
    }
}
