//! Error types for wire format handling.

use thiserror::Error;

/// Errors produced while encoding or decoding wire payloads.
///
/// A `ProtocolError` from an inbound frame is always recoverable: the frame is
/// dropped and the stream continues. It must never be escalated into a
/// connection error.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame was not valid JSON or was missing a required field.
    #[error("malformed frame: {0}")]
    MalformedFrame(#[source] serde_json::Error),

    /// Outbound payload could not be serialized.
    #[error("frame encoding failed: {0}")]
    Encode(#[source] serde_json::Error),
}
