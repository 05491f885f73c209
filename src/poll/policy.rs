//! Poll budget and delay schedule.

use std::time::Duration;

use tokio_retry::strategy::{ExponentialBackoff, FixedInterval};

use crate::config::{POLL_BACKOFF_FACTOR, POLL_INTERVAL, POLL_MAX_ATTEMPTS};

/// Shape of the delay between two analysis queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `interval` before every query
    Fixed,
    /// `interval`, then doubling, never above `max_delay`
    Exponential { max_delay: Duration },
}

/// How often and how long to poll for a completed analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// First (or every) delay between queries
    pub interval: Duration,
    /// Total queries allowed, the first one included
    pub max_attempts: usize,
    pub backoff: Backoff,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            max_attempts: POLL_MAX_ATTEMPTS,
            backoff: Backoff::Fixed,
        }
    }
}

impl PollPolicy {
    /// Delays to wait after each non-terminal query.
    ///
    /// Yields `max_attempts - 1` items; when it runs dry the budget is spent.
    pub fn delays(&self) -> Box<dyn Iterator<Item = Duration> + Send> {
        let retries = self.max_attempts.saturating_sub(1);
        match self.backoff {
            Backoff::Fixed => Box::new(FixedInterval::new(self.interval).take(retries)),
            Backoff::Exponential { max_delay } => {
                // tokio-retry yields factor * base^n, so base is the growth rate
                // and factor is chosen to make the first delay equal `interval`.
                let interval_ms = (self.interval.as_millis() as u64).max(POLL_BACKOFF_FACTOR);
                Box::new(
                    ExponentialBackoff::from_millis(POLL_BACKOFF_FACTOR)
                        .factor(interval_ms / POLL_BACKOFF_FACTOR)
                        .max_delay(max_delay)
                        .take(retries),
                )
            }
        }
    }

    /// Worst-case time spent waiting between queries.
    pub fn max_wait(&self) -> Duration {
        self.delays().sum()
    }
}
