//! Error types for the session client.

use std::time::Duration;

use roost_protocol::ProtocolError;

/// Errors produced by the session client.
///
/// Only [`ClientError::InvalidConfig`] ever surfaces synchronously from
/// [`Connector::open`](crate::Connector::open). Everything else happens
/// inside the session task and reaches the caller as a
/// [`SessionEvent`](crate::SessionEvent), stringified — the lifecycle
/// layer treats every terminating failure identically, so the typed
/// detail only matters for logs.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The session config failed validation before any I/O happened.
    #[error("invalid session config: {0}")]
    InvalidConfig(String),

    /// The TCP/WebSocket connection could not be established.
    #[cfg(feature = "websocket")]
    #[error("connect to {target} failed: {source}")]
    ConnectFailed {
        target: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },

    /// A connect or handshake phase exceeded its deadline.
    #[error("{phase} timed out after {timeout:?}")]
    Timeout {
        phase: &'static str,
        timeout: Duration,
    },

    /// The gateway refused the handshake (bad credential, version
    /// mismatch, ...).
    #[error("gateway rejected handshake: {code} {message}")]
    HandshakeRejected { code: u16, message: String },

    /// The transport dropped before the expected reply arrived.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// The session task is gone; the handle is stale.
    #[error("session is no longer running")]
    Stale,

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
