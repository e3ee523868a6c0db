//! Environment configuration for the daemon.
//!
//! Every knob is a `ROOST_*` variable. Parsing goes through a lookup
//! closure so tests hand in a plain table instead of mutating the
//! process environment. Blank and whitespace-only values count as
//! unset.
//!
//! All errors here are fatal: the daemon refuses to start on a bad
//! config rather than limping along with a guessed one.

use std::net::SocketAddr;
use std::time::Duration;

use roost_client::{AuthMode, Target};
use roost_lifecycle::{
    KeepAlivePolicy, LifecycleConfig, ProbeConfig, ProbeExhaustPolicy, RetryPolicy,
};

/// A rejected or missing environment variable.
///
/// The display string always names the variable, so the one fatal log
/// line at startup points straight at the fix.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required but not set")]
    Missing(&'static str),

    #[error("{var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// The daemon's full configuration, parsed and validated.
#[derive(Debug, Clone)]
pub struct RoostConfig {
    /// The real gateway target.
    pub server: Target,
    /// Identity presented in the session handshake.
    pub identity: String,
    pub auth: AuthMode,
    /// Credential for [`AuthMode::Token`].
    pub token: Option<String>,
    pub retry: RetryPolicy,
    pub keep_alive: KeepAlivePolicy,
    /// Probe mode, enabled by `ROOST_PROBE_TARGETS`.
    pub probe: Option<ProbeConfig>,
    /// Bind address for the status dashboard.
    pub dashboard_addr: SocketAddr,
}

impl RoostConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration from an arbitrary lookup function.
    ///
    /// | Variable | Meaning | Default |
    /// |---|---|---|
    /// | `ROOST_SERVER` | real target, `host:port` | required |
    /// | `ROOST_IDENTITY` | handshake identity | `roost` |
    /// | `ROOST_AUTH` | `offline` or `token` | `token` |
    /// | `ROOST_TOKEN` | credential | required when auth is `token` |
    /// | `ROOST_MAX_ATTEMPTS` | retry budget before cool-down | `10` |
    /// | `ROOST_RETRY_DELAY_SECS` | fixed delay between attempts | `15` |
    /// | `ROOST_COOL_DOWN_SECS` | cool-down length | `180` |
    /// | `ROOST_KEEP_ALIVE_SECS` | keep-alive period | `50` |
    /// | `ROOST_PROBE_TARGETS` | comma-separated probe targets | unset |
    /// | `ROOST_PROBE_EXHAUST` | `wrap` or `real` | `wrap` |
    /// | `ROOST_DASHBOARD_ADDR` | dashboard bind address | `127.0.0.1:3000` |
    ///
    /// `ROOST_LOG` is also part of the surface but is consumed by the
    /// logging init in `main`, before this parser runs.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &'static str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let server = get("ROOST_SERVER").ok_or(ConfigError::Missing("ROOST_SERVER"))?;
        let server = parse_target("ROOST_SERVER", &server)?;

        let identity = get("ROOST_IDENTITY").unwrap_or_else(|| "roost".to_string());

        let auth = match get("ROOST_AUTH").as_deref() {
            None | Some("token") => AuthMode::Token,
            Some("offline") => AuthMode::Offline,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "ROOST_AUTH",
                    reason: format!("expected \"offline\" or \"token\", got {other:?}"),
                });
            }
        };
        let token = get("ROOST_TOKEN");
        if auth == AuthMode::Token && token.is_none() {
            return Err(ConfigError::Missing("ROOST_TOKEN"));
        }

        let retry_defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: parse_number(
                "ROOST_MAX_ATTEMPTS",
                get("ROOST_MAX_ATTEMPTS"),
                retry_defaults.max_attempts,
            )?,
            retry_delay: Duration::from_secs(parse_number(
                "ROOST_RETRY_DELAY_SECS",
                get("ROOST_RETRY_DELAY_SECS"),
                retry_defaults.retry_delay.as_secs(),
            )?),
            cool_down: Duration::from_secs(parse_number(
                "ROOST_COOL_DOWN_SECS",
                get("ROOST_COOL_DOWN_SECS"),
                retry_defaults.cool_down.as_secs(),
            )?),
        };

        let keep_alive_defaults = KeepAlivePolicy::default();
        let period_secs = parse_number(
            "ROOST_KEEP_ALIVE_SECS",
            get("ROOST_KEEP_ALIVE_SECS"),
            keep_alive_defaults.period.as_secs(),
        )?;
        if period_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "ROOST_KEEP_ALIVE_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }
        let keep_alive = KeepAlivePolicy {
            period: Duration::from_secs(period_secs),
            ..keep_alive_defaults
        };

        let probe = match get("ROOST_PROBE_TARGETS") {
            None => None,
            Some(raw) => {
                let mut candidates = Vec::new();
                for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                    candidates.push(parse_target("ROOST_PROBE_TARGETS", part)?);
                }
                if candidates.is_empty() {
                    return Err(ConfigError::Invalid {
                        var: "ROOST_PROBE_TARGETS",
                        reason: "no targets in list".to_string(),
                    });
                }
                let exhaust = match get("ROOST_PROBE_EXHAUST").as_deref() {
                    None | Some("wrap") => ProbeExhaustPolicy::WrapAround,
                    Some("real") => ProbeExhaustPolicy::FallThroughToReal,
                    Some(other) => {
                        return Err(ConfigError::Invalid {
                            var: "ROOST_PROBE_EXHAUST",
                            reason: format!("expected \"wrap\" or \"real\", got {other:?}"),
                        });
                    }
                };
                Some(ProbeConfig::new(candidates).with_exhaust_policy(exhaust))
            }
        };

        let dashboard_addr = match get("ROOST_DASHBOARD_ADDR") {
            Some(raw) => raw.parse().map_err(|e| ConfigError::Invalid {
                var: "ROOST_DASHBOARD_ADDR",
                reason: format!("cannot parse {raw:?}: {e}"),
            })?,
            None => SocketAddr::from(([127, 0, 0, 1], 3000)),
        };

        Ok(Self {
            server,
            identity,
            auth,
            token,
            retry,
            keep_alive,
            probe,
            dashboard_addr,
        })
    }

    /// Assembles the supervisor config from the parsed parts.
    pub fn lifecycle(&self) -> LifecycleConfig {
        let mut config = LifecycleConfig::new(self.server.clone(), self.identity.clone())
            .with_retry(self.retry)
            .with_keep_alive(self.keep_alive);
        if self.auth == AuthMode::Token {
            if let Some(token) = &self.token {
                config = config.with_token(token.clone());
            }
        }
        if let Some(probe) = &self.probe {
            config = config.with_probe(probe.clone());
        }
        config
    }
}

fn parse_target(var: &'static str, raw: &str) -> Result<Target, ConfigError> {
    raw.parse().map_err(|e| ConfigError::Invalid {
        var,
        reason: format!("{e}"),
    })
}

fn parse_number<T>(var: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw.parse::<T>().map_err(|e| ConfigError::Invalid {
            var,
            reason: format!("cannot parse {raw:?}: {e}"),
        }),
        None => Ok(default),
    }
}
