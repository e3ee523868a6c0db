//! Lifecycle events emitted by a session task.

use roost_protocol::EntityId;

/// What happened to a session.
///
/// Events arrive in order on the receiver returned by
/// [`Connector::open`](crate::Connector::open). `TransportLost` and
/// `Errored` are terminal: the task emits one of them (at most) and
/// exits, closing the channel. `WorldEntered` may repeat — some
/// gateways re-announce the world for a live session, and consumers
/// must tolerate that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Handshake accepted; the transport is open but the presence is
    /// not in-world yet.
    TransportOpen { entity: EntityId },

    /// The presence is live in the named world.
    WorldEntered { world: String },

    /// The transport is gone: server disconnect, clean close, or a
    /// read failure. Covers every "was up, now down" case.
    TransportLost { reason: String },

    /// The attempt failed before or during establishment, or the
    /// session hit a fault that prevents continuing.
    Errored { message: String },
}

impl SessionEvent {
    /// True for events that end the session.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionEvent::TransportLost { .. } | SessionEvent::Errored { .. }
        )
    }
}
