//! The reconnection policy: fixed-delay retries until the attempt
//! budget is spent, then one long cool-down before the cycle restarts.
//!
//! Deliberately dumb. There is no jitter and no exponential growth, and
//! every terminating event is weighed identically — an auth rejection
//! and a dropped socket cost the same attempt. Failure-kind-aware
//! backoff could be layered on later without changing the decision
//! surface.

use std::time::Duration;

/// Tunables for the reconnection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Failed attempts tolerated before a cool-down kicks in.
    pub max_attempts: u32,
    /// Fixed pause between consecutive attempts.
    pub retry_delay: Duration,
    /// Pause once the budget is spent. The counter resets when it ends.
    pub cool_down: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            retry_delay: Duration::from_secs(15),
            cool_down: Duration::from_secs(180),
        }
    }
}

/// What the policy wants done after a terminating event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Schedule the next attempt after the fixed delay.
    RetryAfter(Duration),
    /// Budget spent. Wait out the long pause, then start a fresh cycle.
    CoolDownAfter(Duration),
}

/// Attempt counter plus the policy it answers to.
///
/// `next()` is the only mutation path besides [`RetrySchedule::reset`]:
/// it reads the counter, and increments it only when the answer is a
/// retry. With `max_attempts = N`, decisions 1 through N come back
/// [`RetryDecision::RetryAfter`] and decision N+1 is the first
/// [`RetryDecision::CoolDownAfter`].
#[derive(Debug, Clone)]
pub struct RetrySchedule {
    policy: RetryPolicy,
    attempts: u32,
}

impl RetrySchedule {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
        }
    }

    /// Consecutive failed attempts since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Decides what follows a terminating event.
    pub fn next(&mut self) -> RetryDecision {
        if self.attempts < self.policy.max_attempts {
            self.attempts += 1;
            RetryDecision::RetryAfter(self.policy.retry_delay)
        } else {
            RetryDecision::CoolDownAfter(self.policy.cool_down)
        }
    }

    /// Clears the counter. Called on entering `Active` and when a
    /// cool-down elapses.
    pub fn reset(&mut self) {
        if self.attempts != 0 {
            tracing::trace!(attempts = self.attempts, "attempt counter reset");
        }
        self.attempts = 0;
    }
}
