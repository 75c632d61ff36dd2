//! Production Environment implementation using system time and RNG.

use std::time::Duration;

use auxroom_core::env::Environment;
use time::OffsetDateTime;

/// Production environment: real monotonic clock, tokio sleep, OS randomness.
///
/// # Panics
///
/// Panics if the OS RNG fails. Jitter randomness is not security-critical,
/// but an OS that cannot produce entropy is broken in ways this client
/// cannot recover from.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).expect("invariant: OS RNG failure is unrecoverable");
    }

    fn wall_clock(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
