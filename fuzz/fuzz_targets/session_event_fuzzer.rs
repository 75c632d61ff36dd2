//! Fuzz target for the session engine
//!
//! Drives the whole aggregator through arbitrary event interleavings, the
//! way a hostile network and an impatient user would.
//!
//! # Strategy
//!
//! - Arbitrary events: transport reports, raw frames, polls, ticks, sends
//! - Hand-advanced clock: polls and ticks carry fuzzer-chosen instants
//! - Close ends the sequence, as the runtime stops feeding events there
//!
//! # Invariants
//!
//! - Processing NEVER panics, whatever the event order or frame bytes
//! - Message sequences are exactly 0..n in display order, across reconnects
//! - Interpolated progress never exceeds a known track duration
//! - A send that succeeds produced a decodable frame with non-blank text
//! - A send that fails appends nothing

#![no_main]

use std::{ops::Sub, time::Duration};

use arbitrary::Arbitrary;
use auxroom_core::{
    ConnectionStatus, RoomIdentity, SendError, SessionConfig, SessionCore, SessionEvent,
    env::Environment,
};
use auxroom_proto::{ChatFrame, playback::NowPlayingResponse};
use libfuzzer_sys::fuzz_target;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct FakeInstant(u64);

impl Sub for FakeInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(rhs.0))
    }
}

#[derive(Clone)]
struct FuzzEnv;

impl Environment for FuzzEnv {
    type Instant = FakeInstant;

    fn now(&self) -> FakeInstant {
        FakeInstant(0)
    }

    fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        async {}
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = i as u8;
        }
    }

    fn wall_clock(&self) -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum SessionOp {
    TransportOpened,
    TransportLost,
    BackoffElapsed,
    RawFrame { bytes: Vec<u8> },
    ValidFrame { sender: String, text: String },
    Poll { playing: bool, progress_ms: u32, duration_ms: u32, advance_ms: u16 },
    ProgressTick { advance_ms: u16 },
    SendChat { text: String },
    Close,
}

fuzz_target!(|ops: Vec<SessionOp>| {
    let identity =
        RoomIdentity { id: "fuzz".into(), name: "fuzz".into(), host_name: "fuzz".into() };
    let mut core = SessionCore::new(FuzzEnv, identity, "fuzzer".into(), SessionConfig::default());
    let mut clock = 0u64;

    core.start();

    for op in ops {
        match op {
            SessionOp::TransportOpened => {
                core.handle(SessionEvent::TransportOpened);
            },
            SessionOp::TransportLost => {
                core.handle(SessionEvent::TransportLost);
            },
            SessionOp::BackoffElapsed => {
                core.handle(SessionEvent::BackoffElapsed);
            },
            SessionOp::RawFrame { bytes } => {
                let raw = String::from_utf8_lossy(&bytes).into_owned();
                core.handle(SessionEvent::FrameReceived { raw });
            },
            SessionOp::ValidFrame { sender, text } => {
                let raw = serde_json::json!({
                    "sender": sender,
                    "text": text,
                    "timestamp": "2024-06-01T12:00:00Z",
                })
                .to_string();
                core.handle(SessionEvent::FrameReceived { raw });
            },
            SessionOp::Poll { playing, progress_ms, duration_ms, advance_ms } => {
                clock = clock.saturating_add(u64::from(advance_ms));
                let response = NowPlayingResponse {
                    is_playing: playing,
                    progress_ms: Some(u64::from(progress_ms)),
                    duration_ms: Some(u64::from(duration_ms)),
                    ..NowPlayingResponse::default()
                };
                core.handle(SessionEvent::PollCompleted { response, now: FakeInstant(clock) });
            },
            SessionOp::ProgressTick { advance_ms } => {
                clock = clock.saturating_add(u64::from(advance_ms));
                core.handle(SessionEvent::ProgressTick { now: FakeInstant(clock) });
            },
            SessionOp::SendChat { text } => {
                let before = core.snapshot(FakeInstant(clock)).messages.len();
                match core.send_chat(&text) {
                    Ok(json) => {
                        let frame = ChatFrame::parse(&json).expect("sent frame must decode");
                        assert!(!frame.text.trim().is_empty());
                        assert_eq!(core.connection_status(), ConnectionStatus::Connected);
                        assert_eq!(core.snapshot(FakeInstant(clock)).messages.len(), before + 1);
                    },
                    Err(SendError::EmptyText) => {
                        assert!(text.trim().is_empty());
                        assert_eq!(core.snapshot(FakeInstant(clock)).messages.len(), before);
                    },
                    Err(_) => {
                        assert_ne!(core.connection_status(), ConnectionStatus::Connected);
                        assert_eq!(core.snapshot(FakeInstant(clock)).messages.len(), before);
                    },
                }
            },
            SessionOp::Close => {
                core.close();
                assert_eq!(core.connection_status(), ConnectionStatus::Disconnected);
                // The runtime stops feeding events once closed.
                break;
            },
        }

        let state = core.snapshot(FakeInstant(clock));
        for (i, message) in state.messages.iter().enumerate() {
            assert_eq!(message.sequence, i as u64);
        }
        if let Some(playback) = &state.playback {
            if let Some(duration) = playback.duration_ms {
                assert!(playback.progress_ms <= duration);
            }
        }
    }
});
