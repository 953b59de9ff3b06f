//! Bounded, fixed-delay reconnect policy
//!
//! One budget is shared by attempt failures and post-connect losses. The
//! delay never grows and carries no jitter.

use std::time::Duration;

/// What to do after a failure or loss
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Schedule another attempt after `delay`. `remaining` is the budget left
    /// after this retry was charged.
    Retry { delay: Duration, remaining: u32 },
    /// Report the failure to the application and stop.
    GiveUp,
}

/// Retry budget and interval for one client
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    max_tries: u32,
    remaining: u32,
    interval: Duration,
}

impl ReconnectPolicy {
    pub fn new(max_tries: u32, interval: Duration) -> Self {
        Self {
            max_tries,
            remaining: max_tries,
            interval,
        }
    }

    /// Refill the budget.
    pub fn reset(&mut self) {
        self.remaining = self.max_tries;
    }

    /// Decide on a failure. `suppressed` is set when the user closed the
    /// connection; it always gives up without charging the budget.
    pub fn on_failure(&mut self, suppressed: bool) -> RetryDecision {
        if suppressed || self.remaining == 0 {
            return RetryDecision::GiveUp;
        }

        self.remaining -= 1;
        RetryDecision::Retry {
            delay: self.interval,
            remaining: self.remaining,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn max_tries(&self) -> u32 {
        self.max_tries
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_counts_down_then_gives_up() {
        let mut policy = ReconnectPolicy::new(3, Duration::from_secs(2));

        for expected in [2, 1, 0] {
            assert_eq!(
                policy.on_failure(false),
                RetryDecision::Retry {
                    delay: Duration::from_secs(2),
                    remaining: expected
                }
            );
        }
        assert!(policy.is_exhausted());
        assert_eq!(policy.on_failure(false), RetryDecision::GiveUp);
        assert_eq!(policy.on_failure(false), RetryDecision::GiveUp);
    }

    #[test]
    fn test_reset_refills_from_any_level() {
        let mut policy = ReconnectPolicy::new(5, Duration::from_millis(100));
        policy.on_failure(false);
        policy.on_failure(false);
        assert_eq!(policy.remaining(), 3);

        policy.reset();
        assert_eq!(policy.remaining(), 5);
    }

    #[test]
    fn test_suppressed_never_retries_or_charges() {
        let mut policy = ReconnectPolicy::new(2, Duration::from_secs(1));
        assert_eq!(policy.on_failure(true), RetryDecision::GiveUp);
        assert_eq!(policy.remaining(), 2);
    }

    #[test]
    fn test_zero_tries_gives_up_immediately() {
        let mut policy = ReconnectPolicy::new(0, Duration::from_secs(1));
        assert_eq!(policy.on_failure(false), RetryDecision::GiveUp);
    }
}
