//! Session configuration: targets, auth, and per-attempt settings.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ClientError;

/// A gateway address as `host:port`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for Target {
    type Err = ClientError;

    /// Parses `host:port`. Both parts are required; a bare hostname is
    /// rejected rather than guessing a default port.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s.rsplit_once(':').ok_or_else(|| {
            ClientError::InvalidConfig(format!(
                "target `{s}` is not host:port"
            ))
        })?;
        if host.is_empty() {
            return Err(ClientError::InvalidConfig(format!(
                "target `{s}` has an empty host"
            )));
        }
        let port = port.parse::<u16>().map_err(|_| {
            ClientError::InvalidConfig(format!(
                "target `{s}` has an invalid port"
            ))
        })?;
        Ok(Target::new(host, port))
    }
}

/// How the handshake authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// No credential; the gateway accepts the identity as-is.
    Offline,
    /// The handshake must carry a credential token.
    Token,
}

/// Everything one connection attempt needs.
///
/// Built per attempt by the lifecycle layer (the target changes while
/// probing), validated by the connector before any I/O.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Where to connect.
    pub target: Target,
    /// Display name presented in the handshake.
    pub identity: String,
    /// Handshake auth mode.
    pub auth: AuthMode,
    /// Credential reference, required when `auth` is [`AuthMode::Token`].
    pub credential: Option<String>,
    /// Deadline for TCP + WebSocket establishment.
    pub connect_timeout: Duration,
    /// Deadline for the handshake exchange after the socket is up.
    pub handshake_timeout: Duration,
}

impl SessionConfig {
    /// Creates a config with default timeouts and offline auth.
    pub fn new(target: Target, identity: impl Into<String>) -> Self {
        Self {
            target,
            identity: identity.into(),
            auth: AuthMode::Offline,
            credential: None,
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
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Validates the config before any I/O is attempted.
    ///
    /// This is the session client's only synchronous failure: a config
    /// that fails here is fatal to the attempt immediately, without
    /// consuming a connect.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidConfig`] naming the first problem
    /// found.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.identity.trim().is_empty() {
            return Err(ClientError::InvalidConfig(
                "identity must not be empty".into(),
            ));
        }
        if self.target.host.trim().is_empty() {
            return Err(ClientError::InvalidConfig(
                "target host must not be empty".into(),
            ));
        }
        if self.auth == AuthMode::Token && self.credential.is_none() {
            return Err(ClientError::InvalidConfig(
                "token auth requires a credential".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SessionConfig {
        SessionConfig::new(Target::new("play.example.net", 19132), "roost")
    }

    // =====================================================================
    // Target parsing
    // =====================================================================

    #[test]
    fn test_target_parses_host_and_port() {
        let t: Target = "play.example.net:19132".parse().unwrap();
        assert_eq!(t.host, "play.example.net");
        assert_eq!(t.port, 19132);
    }

    #[test]
    fn test_target_display_round_trips() {
        let t = Target::new("gw.local", 8080);
        let parsed: Target = t.to_string().parse().unwrap();
        assert_eq!(parsed, t);
    }

    #[test]
    fn test_target_rejects_missing_port() {
        let result: Result<Target, _> = "play.example.net".parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_target_rejects_bad_port() {
        let result: Result<Target, _> = "host:99999".parse();
        assert!(result.is_err());

        let result: Result<Target, _> = "host:not-a-port".parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_target_rejects_empty_host() {
        let result: Result<Target, _> = ":19132".parse();
        assert!(result.is_err());
    }

    // =====================================================================
    // SessionConfig validation
    // =====================================================================

    #[test]
    fn test_valid_offline_config_passes() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_empty_identity_is_rejected() {
        let mut cfg = config();
        cfg.identity = "   ".into();
        assert!(matches!(
            cfg.validate(),
            Err(ClientError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_token_auth_without_credential_is_rejected() {
        let mut cfg = config();
        cfg.auth = AuthMode::Token;
        cfg.credential = None;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_with_token_sets_mode_and_credential() {
        let cfg = config().with_token("secret");
        assert_eq!(cfg.auth, AuthMode::Token);
        assert_eq!(cfg.credential.as_deref(), Some("secret"));
        assert!(cfg.validate().is_ok());
    }
}
