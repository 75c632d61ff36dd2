//! Chat frame codec for the persistent room channel.
//!
//! Frames are UTF-8 text encoding one JSON object. `sender`, `text`, and
//! `timestamp` are required; anything extra the server includes (message ids,
//! room ids) is ignored. The `timestamp` is client-supplied wall-clock time
//! and is untrustworthy for ordering across senders - display ordering is
//! assigned locally at arrival time, never taken from the frame.

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// One chat frame as it appears on the wire, inbound and outbound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatFrame {
    /// Display name of the sender.
    pub sender: String,
    /// Message body.
    pub text: String,
    /// Sender-reported wall-clock time, RFC 3339. Informational only.
    pub timestamp: String,
}

impl ChatFrame {
    /// Parse a raw text frame.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::MalformedFrame`] if the payload is not valid JSON or
    /// a required field is missing.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(raw).map_err(ProtocolError::MalformedFrame)
    }

    /// Serialize for transmission.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Encode`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}
