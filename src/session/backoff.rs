use std::time::Duration;

/// Bounded exponential reconnect schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Retry ceiling; attempt numbers run `0..max_attempts`.
    pub max_attempts: u32,
    /// Delay before the first attempt.
    pub base: Duration,
    /// No delay ever exceeds this.
    pub cap: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        ReconnectPolicy {
            max_attempts: 5,
            base: Duration::from_secs(1),
            cap: Duration::from_secs(10),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before attempt number `attempt` (0-based), or `None` once the
    /// ceiling is reached.
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let factor = 1_u32.checked_shl(attempt).unwrap_or(u32::MAX);
        let delay = self.base.checked_mul(factor).unwrap_or(self.cap);
        Some(delay.min(self.cap))
    }

    /// Every delay the policy will ever hand out, in order.
    pub fn schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_attempts).filter_map(move |a| self.delay(a))
    }
}
