//! Configuration for the lifecycle supervisor.

use std::time::Duration;

use roost_client::{AuthMode, SessionConfig, Target};

use crate::{KeepAlivePolicy, LifecycleError, ProbeConfig, RetryPolicy};

/// Everything the supervisor needs to run: who to be, where to go, and
/// how stubborn to be about getting there.
///
/// Validation happens once, in [`spawn_supervisor`], and is fatal —
/// after that the supervisor never returns an error, it only
/// transitions.
///
/// [`spawn_supervisor`]: crate::spawn_supervisor
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// The real target. Probing may delay reaching it, never replace it.
    pub target: Target,
    /// Identity presented in the session handshake.
    pub identity: String,
    pub auth: AuthMode,
    /// Required when `auth` is [`AuthMode::Token`].
    pub credential: Option<String>,
    pub retry: RetryPolicy,
    pub keep_alive: KeepAlivePolicy,
    /// Present only when probe mode is enabled at startup.
    pub probe: Option<ProbeConfig>,
    /// Per-attempt deadline for socket establishment.
    pub connect_timeout: Duration,
    /// Per-attempt deadline for the handshake exchange.
    pub handshake_timeout: Duration,
}

impl LifecycleConfig {
    pub fn new(target: Target, identity: impl Into<String>) -> Self {
        Self {
            target,
            identity: identity.into(),
            auth: AuthMode::Offline,
            credential: None,
            retry: RetryPolicy::default(),
            keep_alive: KeepAlivePolicy::default(),
            probe: None,
            connect_timeout: Duration::from_secs(10),
            handshake_timeout: Duration::from_secs(5),
        }
    }

    /// Switches to token auth with the given credential.
    #[must_use]
    pub fn with_token(mut self, credential: impl Into<String>) -> Self {
        self.auth = AuthMode::Token;
        self.credential = Some(credential.into());
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_keep_alive(mut self, keep_alive: KeepAlivePolicy) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Enables probe mode.
    #[must_use]
    pub fn with_probe(mut self, probe: ProbeConfig) -> Self {
        self.probe = Some(probe);
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Checks the config before the supervisor is spawned.
    ///
    /// # Errors
    /// Returns [`LifecycleError::Config`] naming the first problem
    /// found. These are the only fatal errors in the crate.
    pub fn validate(&self) -> Result<(), LifecycleError> {
        if self.identity.trim().is_empty() {
            return Err(LifecycleError::Config("identity must not be empty".into()));
        }
        if self.target.host.trim().is_empty() {
            return Err(LifecycleError::Config(
                "target host must not be empty".into(),
            ));
        }
        if self.auth == AuthMode::Token && self.credential.is_none() {
            return Err(LifecycleError::Config(
                "token auth requires a credential".into(),
            ));
        }
        if self.keep_alive.period.is_zero() {
            return Err(LifecycleError::Config(
                "keep-alive period must be non-zero".into(),
            ));
        }
        if let Some(probe) = &self.probe {
            if probe.candidates.is_empty() {
                return Err(LifecycleError::Config(
                    "probe mode requires at least one candidate target".into(),
                ));
            }
        }
        Ok(())
    }

    /// Derives the per-attempt session config for the given target.
    pub(crate) fn session_config(&self, target: Target) -> SessionConfig {
        let mut config = SessionConfig::new(target, self.identity.clone())
            .with_connect_timeout(self.connect_timeout)
            .with_handshake_timeout(self.handshake_timeout);
        if self.auth == AuthMode::Token {
            if let Some(credential) = &self.credential {
                config = config.with_token(credential.clone());
            }
        }
        config
    }
}
