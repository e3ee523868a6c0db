//! Session client for the roost gateway.
//!
//! Provides the [`Connector`] trait that abstracts over how sessions are
//! opened, plus the concrete [`WsConnector`] that speaks the gateway's
//! JSON-over-WebSocket protocol.
//!
//! A [`Session`] is one connection attempt: a background task owning the
//! socket, a fire-and-forget action sender, and a stream of
//! [`SessionEvent`]s describing its fate. Sessions are single-use — a
//! reconnect means discarding the old handle and opening a new one.
//!
//! # Features
//!
//! - `websocket` (default) — the WebSocket connector via
//!   `tokio-tungstenite`

mod config;
mod error;
mod event;
mod session;
#[cfg(feature = "websocket")]
mod websocket;

pub use config::{AuthMode, SessionConfig, Target};
pub use error::ClientError;
pub use event::SessionEvent;
pub use session::{Session, SessionEvents};
#[cfg(feature = "websocket")]
pub use websocket::WsConnector;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique session IDs.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for one session. Used only for log correlation —
/// two attempts against the same target get different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    /// Returns a process-unique id.
    pub fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Unwraps to the raw counter value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Opens sessions against a gateway.
///
/// `open` returns as soon as the session task is spawned; connect and
/// handshake outcomes arrive as [`SessionEvent`]s on the returned
/// receiver. The only synchronous failure is config validation.
///
/// The lifecycle layer is written against this trait so tests can swap
/// in a scripted connector.
pub trait Connector: Send + Sync + 'static {
    /// Starts a new session attempt.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidConfig`] if the config fails
    /// validation. Transport and handshake failures are delivered as
    /// events, not returned here.
    fn open(
        &self,
        config: SessionConfig,
    ) -> Result<(Session, SessionEvents), ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_is_unique_and_monotonic() {
        let a = SessionId::next();
        let b = SessionId::next();
        assert!(b.into_inner() > a.into_inner());
    }

    #[test]
    fn test_session_id_display() {
        let id = SessionId(7);
        assert_eq!(id.to_string(), "session-7");
    }
}
