//! Error types for the session engine.
//!
//! Recoverable conditions (transport loss, malformed frames, failed polls)
//! never surface as errors from the engine - they manifest as state changes.
//! The only errors here are the ones a caller must react to directly.

use thiserror::Error;

/// Errors returned by [`crate::SessionCore::send_chat`].
///
/// In every error case nothing is appended to the message log and nothing is
/// transmitted. Sends are deliberately NOT queued across disconnects: a
/// message composed during an outage would arrive stale after a long
/// reconnect, so the send control is surfaced as disabled instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendError {
    /// The channel is not in the `Connected` state.
    #[error("not connected to the room channel")]
    NotConnected,

    /// Message text was empty after trimming.
    #[error("message text is empty")]
    EmptyText,

    /// The outbound frame could not be encoded.
    #[error("outbound frame encoding failed: {0}")]
    Encode(String),
}
