//! Playback Status Provider payload.

use serde::{Deserialize, Serialize};

/// Snapshot returned by the now-playing endpoint.
///
/// Every field is optional on the wire: an absent field means "unknown" and is
/// rendered as a placeholder, never treated as an error. A `duration_ms` of
/// zero carries no more information than an absent one; consumers normalize
/// both to unknown before computing progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NowPlayingResponse {
    /// Whether the host's player is currently playing.
    #[serde(default)]
    pub is_playing: bool,
    /// Track title.
    #[serde(default)]
    pub track_name: Option<String>,
    /// Comma-joined artist names.
    #[serde(default)]
    pub artists: Option<String>,
    /// Album title.
    #[serde(default)]
    pub album_name: Option<String>,
    /// Album art URL.
    #[serde(default)]
    pub album_image: Option<String>,
    /// Point-sample playback position, in milliseconds.
    #[serde(default)]
    pub progress_ms: Option<u64>,
    /// Track length, in milliseconds.
    #[serde(default)]
    pub duration_ms: Option<u64>,
}
