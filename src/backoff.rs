//! Linear idle backoff with a ceiling.
//!
//! Each consecutive empty (or failed) poll waits `step` longer than the
//! previous one, starting at `base` and never exceeding `cap`. Any record
//! that reaches the sink resets the interval to `base`.

use std::time::Duration;

/// Backoff parameters. Defaults: 1s floor, +1s per idle poll, 30s ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub step: Duration,
    pub cap: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            step: Duration::from_secs(1),
            cap: Duration::from_secs(30),
        }
    }
}

impl BackoffPolicy {
    pub fn new(base: Duration, step: Duration, cap: Duration) -> Self {
        Self { base, step, cap }
    }

    /// Wait before the `attempt`-th consecutive idle retry (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.step
            .checked_mul(attempt)
            .and_then(|grown| self.base.checked_add(grown))
            .map_or(self.cap, |d| d.min(self.cap))
    }
}

/// Running backoff state for one consumer.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    attempt: u32,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self { policy, attempt: 0 }
    }

    /// Return the next wait and escalate for the following call.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.policy.delay_for(self.attempt);
        if delay < self.policy.cap {
            self.attempt = self.attempt.saturating_add(1);
        }
        delay
    }

    /// Interval the next idle poll would wait, without escalating.
    pub fn peek(&self) -> Duration {
        self.policy.delay_for(self.attempt)
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn grows_linearly_from_floor() {
        let mut backoff = Backoff::new(BackoffPolicy::new(secs(1), secs(1), secs(60)));
        let waits: Vec<_> = (0..4).map(|_| backoff.next_delay()).collect();
        assert_eq!(waits, vec![secs(1), secs(2), secs(3), secs(4)]);
    }

    #[test]
    fn never_exceeds_cap_and_stays_there() {
        let mut backoff = Backoff::new(BackoffPolicy::new(secs(1), secs(2), secs(4)));
        let waits: Vec<_> = (0..6).map(|_| backoff.next_delay()).collect();
        assert_eq!(waits, vec![secs(1), secs(3), secs(4), secs(4), secs(4), secs(4)]);
    }

    #[test]
    fn reset_returns_to_floor() {
        let mut backoff = Backoff::new(BackoffPolicy::default());
        backoff.next_delay();
        backoff.next_delay();
        assert_eq!(backoff.peek(), secs(3));
        backoff.reset();
        assert_eq!(backoff.next_delay(), secs(1));
    }

    #[test]
    fn huge_attempt_saturates_at_cap() {
        let policy = BackoffPolicy::new(secs(1), Duration::MAX, secs(45));
        assert_eq!(policy.delay_for(u32::MAX), secs(45));
    }
}
