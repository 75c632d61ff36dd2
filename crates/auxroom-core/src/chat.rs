//! Message stream sequencing.
//!
//! Inbound frames arrive in transport order; the log assigns each
//! successfully-parsed message a strictly increasing sequence number, which
//! is the sole display-ordering key. The embedded wall-clock timestamp is
//! client-supplied and untrustworthy across senders, so it is kept for
//! display only.
//!
//! The log is append-only for the lifetime of the session and survives
//! reconnects; it is discarded only when the session itself is torn down.
//!
//! Locally-sent messages are appended optimistically before any server
//! acknowledgment and are NOT matched against the server's later broadcast
//! of the same content. Echo suppression by content matching is unreliable
//! for free text, so the stream tolerates an informational duplicate line
//! instead.

use auxroom_proto::{ChatFrame, ProtocolError};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Where a message entered the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOrigin {
    /// Appended optimistically by this client on send.
    Local,
    /// Received over the room channel.
    Remote,
}

/// One chat message, immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Display name of the sender.
    pub sender: String,
    /// Message body.
    pub text: String,
    /// Sender-reported wall-clock time. `None` if absent or unparseable.
    pub sent_at: Option<OffsetDateTime>,
    /// Local arrival order; the display ordering key.
    pub sequence: u64,
    /// Where the message entered the log.
    pub origin: MessageOrigin,
}

/// Append-only, locally-ordered message log.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<ChatMessage>,
    next_sequence: u64,
}

impl MessageLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and append one inbound frame.
    ///
    /// # Errors
    ///
    /// [`ProtocolError`] if the frame is malformed. The log is untouched and
    /// the sequence counter does not advance; the caller logs and drops.
    pub fn ingest(&mut self, raw: &str) -> Result<&ChatMessage, ProtocolError> {
        let frame = ChatFrame::parse(raw)?;
        let sent_at = OffsetDateTime::parse(&frame.timestamp, &Rfc3339).ok();
        Ok(self.push(frame.sender, frame.text, sent_at, MessageOrigin::Remote))
    }

    /// Append the optimistic local echo of an outbound message.
    pub fn append_local(
        &mut self,
        sender: &str,
        text: &str,
        sent_at: OffsetDateTime,
    ) -> &ChatMessage {
        self.push(sender.to_owned(), text.to_owned(), Some(sent_at), MessageOrigin::Local)
    }

    /// All messages, ordered by sequence.
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of messages in the log.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn push(
        &mut self,
        sender: String,
        text: String,
        sent_at: Option<OffsetDateTime>,
        origin: MessageOrigin,
    ) -> &ChatMessage {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.messages.push(ChatMessage { sender, text, sent_at, sequence, origin });
        // Just pushed, the log is never empty here.
        &self.messages[self.messages.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use time::macros::datetime;

    use super::*;

    fn frame_json(sender: &str, text: &str) -> String {
        format!(r#"{{"sender":"{sender}","text":"{text}","timestamp":"2024-06-01T12:00:00Z"}}"#)
    }

    #[test]
    fn ingest_assigns_increasing_sequences() {
        let mut log = MessageLog::new();
        log.ingest(&frame_json("a", "one")).unwrap();
        log.ingest(&frame_json("b", "two")).unwrap();
        log.ingest(&frame_json("a", "three")).unwrap();

        let sequences: Vec<u64> = log.messages().iter().map(|m| m.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
    }

    #[test]
    fn malformed_frame_leaves_log_untouched() {
        let mut log = MessageLog::new();
        log.ingest(&frame_json("a", "one")).unwrap();

        assert!(log.ingest("garbage").is_err());
        assert!(log.ingest(r#"{"sender":"a"}"#).is_err());

        assert_eq!(log.len(), 1);
        // Sequence counter did not advance for the dropped frames.
        let msg = log.ingest(&frame_json("a", "two")).unwrap();
        assert_eq!(msg.sequence, 1);
    }

    #[test]
    fn timestamp_parses_rfc3339() {
        let mut log = MessageLog::new();
        let msg = log.ingest(&frame_json("a", "hi")).unwrap();
        assert_eq!(msg.sent_at, Some(datetime!(2024-06-01 12:00:00 UTC)));
    }

    #[test]
    fn bad_timestamp_degrades_to_none() {
        let mut log = MessageLog::new();
        let raw = r#"{"sender":"a","text":"hi","timestamp":"yesterday-ish"}"#;
        let msg = log.ingest(raw).unwrap();

        assert_eq!(msg.sent_at, None);
        assert_eq!(msg.text, "hi");
    }

    #[test]
    fn local_echo_and_remote_broadcast_both_kept() {
        let mut log = MessageLog::new();
        log.append_local("me", "hello", datetime!(2024-06-01 12:00:00 UTC));
        log.ingest(&frame_json("me", "hello")).unwrap();

        assert_eq!(log.len(), 2);
        assert_eq!(log.messages()[0].origin, MessageOrigin::Local);
        assert_eq!(log.messages()[1].origin, MessageOrigin::Remote);
    }

    proptest! {
        #[test]
        fn sequences_strictly_increase_under_mixed_input(
            frames in prop::collection::vec(prop_oneof![
                Just("garbage".to_string()),
                Just(String::new()),
                ("[a-z]{1,8}", "[ -~]{0,16}").prop_map(|(s, t)| {
                    serde_json::json!({
                        "sender": s,
                        "text": t,
                        "timestamp": "2024-06-01T12:00:00Z",
                    }).to_string()
                }),
            ], 0..64),
        ) {
            let mut log = MessageLog::new();
            for raw in &frames {
                let _ = log.ingest(raw);
            }
            let sequences: Vec<u64> = log.messages().iter().map(|m| m.sequence).collect();
            let expected: Vec<u64> = (0..log.len() as u64).collect();
            prop_assert_eq!(sequences, expected);
        }
    }
}
