//! Exponential-backoff settings for retrying failed status requests.
//!
//! Retrying is off by default: a transport error on a status request
//! fails the job. Setting [`RetryConfig::max_retries`] allows that many
//! extra attempts per poll tick, spaced by increasing delays.

use std::time::Duration;

/// Tunable parameters for the exponential-backoff strategy.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Extra attempts after a failed request. `0` disables retrying.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delays to sleep before each retry of one failed status request.
    ///
    /// Yields exactly `max_retries` delays, starting at `initial_delay`
    /// and growing by `multiplier` up to `max_delay`. The schedule starts
    /// over on every poll tick.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        std::iter::successors(Some(self.initial_delay.min(self.max_delay)), move |&d| {
            Some(grow(d, self))
        })
        .take(self.max_retries as usize)
    }
}

fn grow(current: Duration, config: &RetryConfig) -> Duration {
    current.mul_f64(config.multiplier).min(config.max_delay)
}
