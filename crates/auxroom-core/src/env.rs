//! Environment abstraction for deterministic testing.
//!
//! Decouples session logic from system resources (monotonic time, wall-clock
//! time, randomness). Tests run against fixed instants and seeded bytes;
//! production uses real system resources (see `SystemEnv` in
//! `auxroom-client`).

use std::time::Duration;

use time::OffsetDateTime;

/// Abstract environment providing time and randomness.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - Methods are infallible except in exceptional circumstances (e.g., OS
///   entropy exhaustion)
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`; tests may use any
    /// ordered instant type they can advance by hand.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current monotonic time.
    ///
    /// # Invariants
    ///
    /// - Subsequent calls must return times >= previous calls.
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// This is the ONLY async method in the trait, and it should only be used
    /// by driver code (not session logic).
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    ///
    /// Used for reconnect backoff jitter, so deterministic implementations
    /// are fine for tests.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Current wall-clock time.
    ///
    /// Only used to stamp outbound chat frames; never used for ordering.
    fn wall_clock(&self) -> OffsetDateTime;

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}
