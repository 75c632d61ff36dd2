//! Observable room state.
//!
//! [`RoomState`] is the single artifact shared with a presentation layer. It
//! is recomputed and replaced wholesale on every processed event; consumers
//! receive read-only snapshots and never mutate them in place, so there is no
//! torn-read hazard even under concurrent rendering.

use crate::{ChatMessage, ConnectionStatus};

/// Static room metadata, immutable once fetched from the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomIdentity {
    /// Opaque room identifier.
    pub id: String,
    /// Human-readable room name.
    pub name: String,
    /// Display name of the room host.
    pub host_name: String,
}

/// Playback as a presentation layer should render it.
///
/// `progress_ms` is already interpolated against the local clock at snapshot
/// time, so consumers need no clock of their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackView {
    /// Whether the host's player is playing.
    pub is_playing: bool,
    /// Track title, if known.
    pub track_name: Option<String>,
    /// Artist names, if known.
    pub artists: Option<String>,
    /// Album title, if known.
    pub album_name: Option<String>,
    /// Album art URL, if known.
    pub album_image_url: Option<String>,
    /// Interpolated playback position, in milliseconds.
    pub progress_ms: u64,
    /// Track length in milliseconds. `None` suppresses the progress bar.
    pub duration_ms: Option<u64>,
}

/// One immutable view of the whole room session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomState {
    /// Static room metadata.
    pub identity: RoomIdentity,
    /// Current channel status.
    pub connection: ConnectionStatus,
    /// All messages in display order (by local sequence).
    pub messages: Vec<ChatMessage>,
    /// Latest playback view. `None` until the first successful poll.
    pub playback: Option<PlaybackView>,
    /// Whether the playback data is older than the freshness threshold and
    /// must not be trusted as live.
    pub playback_stale: bool,
}
