//! Error types for the lifecycle layer.

/// Errors that can occur while assembling or driving a lifecycle
/// supervisor.
///
/// Config errors are deliberately fatal: a daemon that cannot describe
/// where to connect has nothing to supervise, so these surface before
/// the actor is ever spawned. Everything that happens *after* start is
/// handled internally by the reconnection policy and never reaches the
/// caller as an error.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// The supplied [`LifecycleConfig`](crate::LifecycleConfig) is
    /// unusable: empty identity, missing credential for token auth,
    /// zero-duration timers, or an empty probe candidate list.
    #[error("invalid lifecycle config: {0}")]
    Config(String),

    /// The supervisor actor is gone — its task has shut down and the
    /// command channel is closed. Seen when calling a handle after
    /// `stop()`.
    #[error("lifecycle supervisor is not running")]
    Unavailable,
}
