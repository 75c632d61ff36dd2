//! Room session aggregator.
//!
//! [`SessionCore`] merges the connection tracker, message log, and playback
//! model into one state machine in the action pattern: the driving runtime
//! feeds [`SessionEvent`]s in and executes the returned [`SessionAction`]s.
//! Each processed event that changes anything yields a synchronous
//! [`SessionAction::PublishState`], so a subscriber always observes state
//! reflecting every processed event.
//!
//! All mutation happens here, on one event at a time; there is no shared
//! mutable state and no locking anywhere in the engine.

use auxroom_proto::{ChatFrame, playback::NowPlayingResponse};
use time::format_description::well_known::Rfc3339;

use crate::{
    ConnectionStatus, ConnectionTracker, MessageLog, PlaybackModel, PlaybackView, RoomIdentity,
    RoomState, SendError, SessionConfig, env::Environment,
};

/// Inputs to the session state machine.
///
/// Generic over `I` (instant type) so interpolation and staleness are
/// testable with hand-built instants.
#[derive(Debug, Clone)]
pub enum SessionEvent<I> {
    /// The transport handshake completed.
    TransportOpened,

    /// The transport failed or closed for any reason, including a normal
    /// closure initiated by the remote end.
    TransportLost,

    /// The reconnect backoff elapsed; the next attempt is starting.
    BackoffElapsed,

    /// One raw text frame arrived, in transport order.
    FrameReceived {
        /// Raw frame contents.
        raw: String,
    },

    /// A playback poll completed successfully.
    PollCompleted {
        /// The provider's response.
        response: NowPlayingResponse,
        /// Local monotonic time the response was received.
        now: I,
    },

    /// Periodic tick for re-publishing interpolated progress.
    ProgressTick {
        /// Current local monotonic time.
        now: I,
    },
}

/// Instructions for the driving runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Recompute and publish a fresh [`RoomState`] snapshot.
    PublishState,

    /// Wait this long, then feed [`SessionEvent::BackoffElapsed`] and start
    /// the next connection attempt.
    ScheduleReconnect(std::time::Duration),
}

/// The session engine for one room.
///
/// Owns every piece of session state exclusively; nothing here is shared
/// across room sessions. The engine never throws recoverable failures at the
/// caller - transport loss, malformed frames, and failed polls all manifest
/// as state.
#[derive(Debug, Clone)]
pub struct SessionCore<E: Environment> {
    env: E,
    identity: RoomIdentity,
    sender_name: String,
    config: SessionConfig,
    connection: ConnectionTracker,
    log: MessageLog,
    playback: PlaybackModel<E::Instant>,
}

impl<E: Environment> SessionCore<E> {
    /// Create an engine for one room session.
    ///
    /// `sender_name` labels outbound messages and is fixed for the session;
    /// changing identity requires a new session and does not retroactively
    /// relabel past messages.
    pub fn new(env: E, identity: RoomIdentity, sender_name: String, config: SessionConfig) -> Self {
        let connection = ConnectionTracker::new(&config);
        Self {
            env,
            identity,
            sender_name,
            config,
            connection,
            log: MessageLog::new(),
            playback: PlaybackModel::new(),
        }
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current channel status.
    pub fn connection_status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    /// Begin the first connection attempt.
    pub fn start(&mut self) -> Vec<SessionAction> {
        let reported = self.connection.open();
        self.publish_if(reported.is_some())
    }

    /// Terminate the session. Terminal: no further reconnection.
    pub fn close(&mut self) -> Vec<SessionAction> {
        let reported = self.connection.close();
        self.publish_if(reported.is_some())
    }

    /// Process one event and return actions for the runtime.
    pub fn handle(&mut self, event: SessionEvent<E::Instant>) -> Vec<SessionAction> {
        match event {
            SessionEvent::TransportOpened => {
                let reported = self.connection.established();
                if reported.is_some() {
                    tracing::debug!(room = %self.identity.id, "room channel connected");
                }
                self.publish_if(reported.is_some())
            },
            SessionEvent::TransportLost => match self.connection.lost() {
                Some(status) => {
                    let delay = self.connection.backoff_delay_jittered(&self.env);
                    tracing::debug!(
                        room = %self.identity.id,
                        ?status,
                        ?delay,
                        "room channel lost, reconnect scheduled"
                    );
                    vec![SessionAction::PublishState, SessionAction::ScheduleReconnect(delay)]
                },
                // Coalesced or already closed: nothing to report.
                None => vec![],
            },
            SessionEvent::BackoffElapsed => {
                let reported = self.connection.backoff_elapsed();
                self.publish_if(reported.is_some())
            },
            SessionEvent::FrameReceived { raw } => match self.log.ingest(&raw) {
                Ok(_) => vec![SessionAction::PublishState],
                Err(error) => {
                    // Non-fatal: drop the frame, the pipeline continues.
                    tracing::warn!(room = %self.identity.id, %error, "dropping malformed frame");
                    vec![]
                },
            },
            SessionEvent::PollCompleted { response, now } => {
                self.playback.record(response, now);
                vec![SessionAction::PublishState]
            },
            SessionEvent::ProgressTick { .. } => {
                // Nothing to re-interpolate before the first poll lands.
                self.publish_if(self.playback.snapshot().is_some())
            },
        }
    }

    /// Validate and stage one outbound chat message.
    ///
    /// On success the local echo is appended to the log (publish a snapshot
    /// after) and the serialized frame is returned for transmission.
    ///
    /// # Errors
    ///
    /// - [`SendError::EmptyText`] if `text` trims to nothing.
    /// - [`SendError::NotConnected`] if the channel is not `Connected`.
    ///   The message is not queued for later delivery.
    ///
    /// In both cases nothing is appended and nothing is transmitted.
    pub fn send_chat(&mut self, text: &str) -> Result<String, SendError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SendError::EmptyText);
        }
        if self.connection.status() != ConnectionStatus::Connected {
            return Err(SendError::NotConnected);
        }

        let sent_at = self.env.wall_clock();
        let timestamp =
            sent_at.format(&Rfc3339).map_err(|e| SendError::Encode(e.to_string()))?;
        let frame = ChatFrame {
            sender: self.sender_name.clone(),
            text: trimmed.to_owned(),
            timestamp,
        };
        let json = frame.to_json().map_err(|e| SendError::Encode(e.to_string()))?;

        self.log.append_local(&self.sender_name, trimmed, sent_at);
        Ok(json)
    }

    /// Compute the current immutable [`RoomState`] snapshot.
    pub fn snapshot(&self, now: E::Instant) -> RoomState {
        let threshold = self.config.staleness_threshold();
        let playback = self.playback.snapshot().map(|s| PlaybackView {
            is_playing: s.is_playing,
            track_name: s.track_name.clone(),
            artists: s.artists.clone(),
            album_name: s.album_name.clone(),
            album_image_url: s.album_image_url.clone(),
            progress_ms: self.playback.progress_ms(now, threshold).unwrap_or(s.progress_ms),
            duration_ms: s.duration_ms,
        });

        RoomState {
            identity: self.identity.clone(),
            connection: self.connection.status(),
            messages: self.log.messages().to_vec(),
            playback,
            playback_stale: self.playback.is_stale(now, threshold),
        }
    }

    fn publish_if(&self, changed: bool) -> Vec<SessionAction> {
        if changed { vec![SessionAction::PublishState] } else { vec![] }
    }
}
