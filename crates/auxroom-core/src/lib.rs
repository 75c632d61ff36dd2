//! Pure state machines for the Auxroom room session engine.
//!
//! Everything in this crate is I/O-free and generic over an `Instant` type,
//! so the same logic runs against real clocks in production and fixed
//! instants in tests. The driving runtime (see `auxroom-client`) feeds events
//! in and executes the returned actions.
//!
//! # Components
//!
//! - [`ConnectionTracker`]: connection lifecycle and reconnect backoff.
//! - [`MessageLog`]: inbound frame sequencing and local echo append.
//! - [`PlaybackModel`]: polled playback snapshots, interpolation, staleness.
//! - [`SessionCore`]: the aggregator tying the above into one
//!   [`RoomState`] snapshot per processed event.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod chat;
mod config;
mod connection;
mod error;
mod playback;
mod session;
mod state;

pub mod env;

pub use chat::{ChatMessage, MessageLog, MessageOrigin};
pub use config::{
    DEFAULT_POLL_INTERVAL, DEFAULT_PROGRESS_TICK, DEFAULT_RECONNECT_BASE_DELAY,
    DEFAULT_RECONNECT_MAX_DELAY, SessionConfig,
};
pub use connection::{ConnectionStatus, ConnectionTracker};
pub use error::SendError;
pub use playback::{PlaybackModel, PlaybackSnapshot};
pub use session::{SessionAction, SessionCore, SessionEvent};
pub use state::{PlaybackView, RoomIdentity, RoomState};
