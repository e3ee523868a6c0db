//! Probe-and-commit: verify connectivity against disposable targets
//! before pointing the machine at the real one.
//!
//! The plan walks an ordered candidate list. The first in-world entry
//! on a candidate proves the path works; the probe session is then torn
//! down and the plan commits to the real target for the rest of the
//! process. Commit happens at most once — after it, the plan is inert
//! and every accessor answers for the real target.

use std::time::Duration;

use roost_client::Target;

use crate::LifecycleError;

/// What to do when every candidate has failed once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeExhaustPolicy {
    /// Start over at the first candidate. Probing never gives up on its
    /// own; only the reconnection policy's cool-down slows it down.
    #[default]
    WrapAround,
    /// Stop probing and commit to the real target unverified.
    FallThroughToReal,
}

/// Configuration for probe mode.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Disposable targets to try, in order. Must be non-empty.
    pub candidates: Vec<Target>,
    pub exhaust: ProbeExhaustPolicy,
    /// How long a successful probe session is held open before teardown.
    /// Keep-alive stays off for the whole window.
    pub grace: Duration,
    /// Pause between closing the probe session and dialing the real
    /// target.
    pub settle: Duration,
}

impl ProbeConfig {
    pub fn new(candidates: Vec<Target>) -> Self {
        Self {
            candidates,
            exhaust: ProbeExhaustPolicy::default(),
            grace: Duration::from_secs(3),
            settle: Duration::from_secs(2),
        }
    }

    #[must_use]
    pub fn with_exhaust_policy(mut self, exhaust: ProbeExhaustPolicy) -> Self {
        self.exhaust = exhaust;
        self
    }

    #[must_use]
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    #[must_use]
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }
}

/// Cursor state for one process's probe run.
#[derive(Debug, Clone)]
pub struct ProbePlan {
    candidates: Vec<Target>,
    cursor: usize,
    real: Target,
    committed: bool,
    exhaust: ProbeExhaustPolicy,
    grace: Duration,
    settle: Duration,
}

impl ProbePlan {
    /// Builds a plan from validated config.
    ///
    /// # Errors
    /// Returns [`LifecycleError::Config`] if the candidate list is
    /// empty — an empty list would leave the cursor pointing nowhere.
    pub fn new(config: ProbeConfig, real: Target) -> Result<Self, LifecycleError> {
        if config.candidates.is_empty() {
            return Err(LifecycleError::Config(
                "probe mode requires at least one candidate target".into(),
            ));
        }
        Ok(Self {
            candidates: config.candidates,
            cursor: 0,
            real,
            committed: false,
            exhaust: config.exhaust,
            grace: config.grace,
            settle: config.settle,
        })
    }

    /// The target the next attempt should dial.
    pub fn current_target(&self) -> &Target {
        if self.committed {
            &self.real
        } else {
            // cursor stays in bounds: new() rejects empty lists and
            // advance wraps at the end of the list
            &self.candidates[self.cursor]
        }
    }

    /// True until the plan commits to the real target.
    pub fn is_probing(&self) -> bool {
        !self.committed
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    pub fn settle(&self) -> Duration {
        self.settle
    }

    /// Moves the cursor past a failed candidate. No-op once committed.
    pub fn on_attempt_failed(&mut self) {
        if self.committed {
            return;
        }
        let next = self.cursor + 1;
        if next < self.candidates.len() {
            self.cursor = next;
            return;
        }
        match self.exhaust {
            ProbeExhaustPolicy::WrapAround => {
                tracing::debug!("probe candidates exhausted; wrapping to first");
                self.cursor = 0;
            }
            ProbeExhaustPolicy::FallThroughToReal => {
                tracing::info!(
                    target = %self.real,
                    "probe candidates exhausted; committing to real target unverified"
                );
                self.committed = true;
            }
        }
    }

    /// Flips the plan to the real target. Idempotent; the flip happens
    /// exactly once per process.
    pub fn commit(&mut self) {
        if !self.committed {
            self.committed = true;
            tracing::debug!(target = %self.real, "probe plan committed");
        }
    }

    /// Points the cursor back at the first candidate, e.g. when a
    /// cool-down elapses mid-probe. No-op once committed.
    pub fn rewind(&mut self) {
        if !self.committed {
            self.cursor = 0;
        }
    }
}
