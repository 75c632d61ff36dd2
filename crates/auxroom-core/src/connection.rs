//! Connection lifecycle state machine.
//!
//! Tracks the status of the persistent room channel and computes reconnect
//! backoff. This is a pure state machine: the driving runtime reports
//! transport outcomes and executes the waits; no I/O happens here.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────────┐ open() ┌────────────┐ established ┌───────────┐
//! │ Disconnected │───────>│ Connecting │────────────>│ Connected │
//! └──────────────┘        └────────────┘             └───────────┘
//!        ↑                   │      ↑                      │
//!        │ close()           │ lost │ backoff elapsed      │ lost
//!        │ (any state,       ↓      │                      ↓
//!        │  terminal)    ┌─────────────────┐   lost (coalesced)
//!        └───────────────│ Reconnecting(n) │<──────────────┘
//!                        └─────────────────┘
//! ```
//!
//! A lost report while already `Reconnecting` is coalesced: rapid failures
//! before the backoff timer fires produce no additional transition. Remote
//! normal closure is reported the same way as an error; the engine does not
//! distinguish the two.

use std::time::Duration;

use crate::{SessionConfig, env::Environment};

/// Largest exponent applied to the backoff base. The cap dominates long
/// before this, it only guards the shift.
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Status of the persistent room channel. Exactly one value at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No channel and no reconnection pending. Terminal once closed.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// Channel established; sends are accepted.
    Connected,
    /// Waiting out the backoff delay before attempt `n + 1`.
    ///
    /// The payload is the number of consecutive failures so far.
    Reconnecting(u32),
}

/// Pure connection lifecycle tracker.
///
/// Every mutating method returns the newly-entered status, or `None` when the
/// report was coalesced or ignored, so the caller can publish each transition
/// exactly once and in order.
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    status: ConnectionStatus,
    attempt: u32,
    base_delay: Duration,
    max_delay: Duration,
    closed: bool,
}

impl ConnectionTracker {
    /// Create a tracker in [`ConnectionStatus::Disconnected`].
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            attempt: 0,
            base_delay: config.reconnect_base_delay,
            max_delay: config.reconnect_max_delay,
            closed: false,
        }
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Consecutive failures since the last successful connection.
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Whether [`Self::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Begin connecting. Only valid from the initial `Disconnected` state.
    pub fn open(&mut self) -> Option<ConnectionStatus> {
        if self.closed || self.status != ConnectionStatus::Disconnected {
            return None;
        }
        self.transition(ConnectionStatus::Connecting)
    }

    /// The transport handshake completed.
    ///
    /// Resets the failure counter so the next outage starts from the base
    /// delay again.
    pub fn established(&mut self) -> Option<ConnectionStatus> {
        if !matches!(self.status, ConnectionStatus::Connecting) {
            return None;
        }
        self.attempt = 0;
        self.transition(ConnectionStatus::Connected)
    }

    /// The transport failed or closed, for any reason.
    ///
    /// Returns `None` if the report is coalesced (already waiting out a
    /// backoff) or the session is closed.
    pub fn lost(&mut self) -> Option<ConnectionStatus> {
        match self.status {
            ConnectionStatus::Connecting | ConnectionStatus::Connected if !self.closed => {
                self.attempt += 1;
                self.transition(ConnectionStatus::Reconnecting(self.attempt))
            },
            _ => None,
        }
    }

    /// The backoff delay elapsed; the next attempt is starting.
    pub fn backoff_elapsed(&mut self) -> Option<ConnectionStatus> {
        if self.closed || !matches!(self.status, ConnectionStatus::Reconnecting(_)) {
            return None;
        }
        self.transition(ConnectionStatus::Connecting)
    }

    /// Terminate the session. No further reconnection after this.
    pub fn close(&mut self) -> Option<ConnectionStatus> {
        self.closed = true;
        if self.status == ConnectionStatus::Disconnected {
            return None;
        }
        self.transition(ConnectionStatus::Disconnected)
    }

    /// Backoff delay for the current failure streak, without jitter.
    ///
    /// `min(cap, base * 2^(n-1))` for attempt `n`.
    #[must_use]
    pub fn backoff_delay(&self) -> Duration {
        let exponent = self.attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
        let delay = self.base_delay.saturating_mul(1u32 << exponent);
        delay.min(self.max_delay)
    }

    /// Backoff delay with +/- 25% jitter applied, clamped to the cap.
    ///
    /// Jitter spreads reconnect storms from many clients recovering from the
    /// same outage.
    #[must_use]
    pub fn backoff_delay_jittered<E: Environment>(&self, env: &E) -> Duration {
        let delay = self.backoff_delay();
        let quarter = delay / 4;
        let span_ms = (quarter * 2).as_millis() as u64;
        if span_ms == 0 {
            return delay;
        }
        let offset = Duration::from_millis(env.random_u64() % (span_ms + 1));
        (delay - quarter + offset).min(self.max_delay)
    }

    fn transition(&mut self, next: ConnectionStatus) -> Option<ConnectionStatus> {
        self.status = next;
        Some(next)
    }
}
