//! Session configuration.

use std::time::Duration;

/// Interval between playback status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Base delay for the first reconnect attempt.
pub const DEFAULT_RECONNECT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Upper bound on the reconnect backoff delay.
pub const DEFAULT_RECONNECT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Interval between interpolated-progress updates.
pub const DEFAULT_PROGRESS_TICK: Duration = Duration::from_secs(1);

/// Tunables for one room session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Interval between playback status polls.
    pub poll_interval: Duration,
    /// Base delay for reconnect backoff.
    pub reconnect_base_delay: Duration,
    /// Cap on reconnect backoff.
    pub reconnect_max_delay: Duration,
    /// Interval at which interpolated playback progress is re-published.
    pub progress_tick: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            reconnect_base_delay: DEFAULT_RECONNECT_BASE_DELAY,
            reconnect_max_delay: DEFAULT_RECONNECT_MAX_DELAY,
            progress_tick: DEFAULT_PROGRESS_TICK,
        }
    }
}

impl SessionConfig {
    /// Age beyond which a playback snapshot is flagged stale.
    ///
    /// Twice the poll interval: one missed poll is tolerated, two consecutive
    /// misses are not.
    pub fn staleness_threshold(&self) -> Duration {
        self.poll_interval * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staleness_threshold_is_twice_poll_interval() {
        let config =
            SessionConfig { poll_interval: Duration::from_secs(7), ..SessionConfig::default() };
        assert_eq!(config.staleness_threshold(), Duration::from_secs(14));
    }
}
