//! Fuzz target for the connection lifecycle state machine
//!
//! Reconnection correctness depends on transitions being reported exactly
//! once and backoff staying bounded under any interleaving of transport
//! reports.
//!
//! # Strategy
//!
//! - Arbitrary op sequences: open / established / lost / backoff / close
//! - Model checking: a shadow status tracks what each report should yield
//!
//! # Invariants
//!
//! - A report that returns `Some` always matches the tracker's new status
//! - `Reconnecting(n)` always carries the current attempt count, n >= 1
//! - Backoff delay never exceeds the configured cap
//! - Close is terminal: every later report returns `None` and status stays
//!   `Disconnected`

#![no_main]

use arbitrary::Arbitrary;
use auxroom_core::{ConnectionStatus, ConnectionTracker, SessionConfig};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum ConnOp {
    Open,
    Established,
    Lost,
    BackoffElapsed,
    Close,
}

fuzz_target!(|ops: Vec<ConnOp>| {
    let config = SessionConfig::default();
    let mut conn = ConnectionTracker::new(&config);
    let mut closed = false;

    for op in ops {
        let reported = match op {
            ConnOp::Open => conn.open(),
            ConnOp::Established => conn.established(),
            ConnOp::Lost => conn.lost(),
            ConnOp::BackoffElapsed => conn.backoff_elapsed(),
            ConnOp::Close => {
                closed = true;
                conn.close()
            },
        };

        if let Some(status) = reported {
            assert_eq!(status, conn.status(), "reported transition must match status");
        }

        if closed {
            assert_eq!(conn.status(), ConnectionStatus::Disconnected);
            assert!(conn.is_closed());
        }

        if let ConnectionStatus::Reconnecting(n) = conn.status() {
            assert_eq!(n, conn.attempt());
            assert!(n >= 1);
        }

        assert!(conn.backoff_delay() <= config.reconnect_max_delay);
    }
});
