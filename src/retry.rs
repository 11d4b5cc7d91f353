use std::time::Duration;

use tokio_retry::strategy::FixedInterval;

use crate::config::ReadinessConfig;

/// Retry policy for the readiness wait: a bounded number of attempts with a
/// fixed pause between them. No exponential growth, no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Delays between consecutive attempts. There is one fewer delay than
    /// attempts since nothing follows the final one.
    pub fn strategy(&self) -> impl Iterator<Item = Duration> {
        let pauses = self.max_attempts.saturating_sub(1) as usize;
        FixedInterval::new(self.delay).take(pauses)
    }

    /// Pause to record after attempt `index` (1-based), if another follows
    pub fn delay_after(&self, index: u32) -> Option<Duration> {
        (index < self.max_attempts).then_some(self.delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&ReadinessConfig::default())
    }
}

impl From<&ReadinessConfig> for RetryPolicy {
    fn from(cfg: &ReadinessConfig) -> Self {
        Self::fixed(cfg.max_retries, cfg.retry_delay())
    }
}
