//! Connection lifecycle supervision for roost.
//!
//! This crate is the daemon's core: a single supervisor actor that
//! owns the connection state machine and everything attached to it —
//!
//! 1. **Reconnection policy** ([`RetryPolicy`]) — fixed-delay retries
//!    with a long cool-down once the attempt budget is spent
//! 2. **Probe-and-commit** ([`ProbeConfig`]) — optionally verify
//!    connectivity against disposable targets before the real one
//! 3. **Keep-alive** ([`KeepAlivePolicy`]) — periodic synthetic
//!    traffic while in-game so the gateway never evicts us for idling
//! 4. **Status publishing** ([`StatusSnapshot`]) — a watch channel the
//!    dashboard reads without ever touching the state machine
//!
//! # How it fits in the stack
//!
//! ```text
//! Status Reporter (above)  ← renders the snapshots this crate publishes
//!     ↕
//! Lifecycle Layer (this crate)  ← decides when to (re)connect and why
//!     ↕
//! Session Client (below)  ← opens one session at a time on our behalf
//! ```
//!
//! Everything steady-state is a transition, not an error: after
//! [`spawn_supervisor`] succeeds, the machine recovers from every
//! failure by scheduling a reconnect and the process never crashes on
//! its account.

mod config;
mod error;
mod keepalive;
mod probe;
mod retry;
mod state;
mod supervisor;

pub use config::LifecycleConfig;
pub use error::LifecycleError;
pub use keepalive::{KeepAliveDriver, KeepAlivePolicy};
pub use probe::{ProbeConfig, ProbeExhaustPolicy, ProbePlan};
pub use retry::{RetryDecision, RetryPolicy, RetrySchedule};
pub use state::{Health, LifecycleState, StatusSnapshot};
pub use supervisor::{SupervisorHandle, spawn_supervisor};
