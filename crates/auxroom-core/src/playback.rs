//! Polled playback state: interpolation and staleness.
//!
//! The Playback Status Provider reports a point sample; between polls the
//! displayed position is interpolated from the monotonic local clock anchored
//! at fetch time. A failed poll never clears the previous snapshot - the
//! snapshot just ages until it crosses the staleness threshold, at which
//! point the view is flagged stale and interpolation freezes.

use std::{ops::Sub, time::Duration};

use auxroom_proto::playback::NowPlayingResponse;

/// One playback snapshot anchored to a local monotonic instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSnapshot<I> {
    /// Whether the host's player was playing at fetch time.
    pub is_playing: bool,
    /// Track title, if known.
    pub track_name: Option<String>,
    /// Artist names, if known.
    pub artists: Option<String>,
    /// Album title, if known.
    pub album_name: Option<String>,
    /// Album art URL, if known.
    pub album_image_url: Option<String>,
    /// Position at fetch time, in milliseconds.
    pub progress_ms: u64,
    /// Track length in milliseconds. `None` means unknown; the progress bar
    /// is suppressed rather than risking a division by zero downstream.
    pub duration_ms: Option<u64>,
    /// Local monotonic instant the snapshot was fetched.
    pub fetched_at: I,
}

/// Holds the latest playback snapshot and answers time-dependent queries.
#[derive(Debug, Clone)]
pub struct PlaybackModel<I> {
    snapshot: Option<PlaybackSnapshot<I>>,
}

impl<I> PlaybackModel<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self { snapshot: None }
    }

    /// Record a successful poll.
    pub fn record(&mut self, response: NowPlayingResponse, now: I) {
        // Zero-length tracks carry no usable duration; normalize to unknown.
        let duration_ms = response.duration_ms.filter(|&d| d > 0);
        self.snapshot = Some(PlaybackSnapshot {
            is_playing: response.is_playing,
            track_name: response.track_name,
            artists: response.artists,
            album_name: response.album_name,
            album_image_url: response.album_image,
            progress_ms: response.progress_ms.unwrap_or(0),
            duration_ms,
            fetched_at: now,
        });
    }

    /// Latest snapshot. `None` until the first successful poll.
    #[must_use]
    pub fn snapshot(&self) -> Option<&PlaybackSnapshot<I>> {
        self.snapshot.as_ref()
    }

    /// Whether the snapshot is older than `threshold`.
    ///
    /// Holds regardless of `is_playing`. `false` while no snapshot exists:
    /// "no data yet" is a distinct presentation from "data went stale".
    #[must_use]
    pub fn is_stale(&self, now: I, threshold: Duration) -> bool {
        self.snapshot.as_ref().is_some_and(|s| now - s.fetched_at > threshold)
    }

    /// Interpolated playback position at `now`, in milliseconds.
    ///
    /// Advances from the fetch anchor while playing and fresh; frozen at the
    /// last sample when paused or stale. Clamped to the track duration when
    /// the duration is known.
    #[must_use]
    pub fn progress_ms(&self, now: I, threshold: Duration) -> Option<u64> {
        let snapshot = self.snapshot.as_ref()?;
        let clamp = |ms: u64| match snapshot.duration_ms {
            Some(duration) => ms.min(duration),
            None => ms,
        };

        if !snapshot.is_playing || self.is_stale(now, threshold) {
            return Some(clamp(snapshot.progress_ms));
        }

        let elapsed_ms = (now - snapshot.fetched_at).as_millis() as u64;
        Some(clamp(snapshot.progress_ms.saturating_add(elapsed_ms)))
    }
}
