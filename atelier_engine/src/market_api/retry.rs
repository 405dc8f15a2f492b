use std::time::Duration;

use rand::Rng;

/// How often a write that lost a race is re-validated and tried again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 5, base_backoff: Duration::from_millis(10) }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_backoff: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), base_backoff }
    }

    /// Exponential backoff with full jitter, so that contenders do not retry in lockstep.
    pub fn backoff(&self, attempt: usize) -> Duration {
        let exp = u32::try_from(attempt.min(8)).unwrap_or(8);
        let ceiling = self.base_backoff.saturating_mul(2u32.saturating_pow(exp));
        let millis = u64::try_from(ceiling.as_millis()).unwrap_or(u64::MAX).max(1);
        Duration::from_millis(rand::thread_rng().gen_range(0..=millis))
    }
}
