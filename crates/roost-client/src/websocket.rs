//! WebSocket connector speaking the gateway protocol, via
//! `tokio-tungstenite`.
//!
//! [`WsConnector::open`] spawns one task per session. The task walks
//! the establishment sequence (connect, handshake, join request) and
//! then pumps frames until something ends the session, reporting
//! progress as [`SessionEvent`]s. It never returns an error to anyone:
//! failures become events, which is exactly what the lifecycle layer
//! wants to consume.

use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{timeout, Instant};
use tokio_tungstenite::tungstenite::Message;

use roost_protocol::{
    ActionMessage, Codec, Envelope, EntityId, JsonCodec, Payload,
    SystemMessage, PROTOCOL_VERSION,
};

use crate::{
    ClientError, Connector, Session, SessionConfig, SessionEvent,
    SessionEvents, SessionId,
};

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// The production [`Connector`]: JSON envelopes over WebSocket.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn open(
        &self,
        config: SessionConfig,
    ) -> Result<(Session, SessionEvents), ClientError> {
        config.validate()?;

        let id = SessionId::next();
        let target = config.target.clone();
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (close_tx, close_rx) = oneshot::channel();

        let task =
            tokio::spawn(run_session(id, config, action_rx, event_tx, close_rx));

        Ok((Session::new(id, target, action_tx, close_tx, task), event_rx))
    }
}

/// Wraps payloads in envelopes with this session's sequence numbering.
struct Framer {
    codec: JsonCodec,
    seq: u64,
    started: Instant,
}

impl Framer {
    fn new() -> Self {
        Self {
            codec: JsonCodec,
            seq: 0,
            started: Instant::now(),
        }
    }

    fn frame(&mut self, payload: Payload) -> Result<Message, ClientError> {
        self.seq += 1;
        let envelope = Envelope {
            seq: self.seq,
            timestamp: self.started.elapsed().as_millis() as u64,
            payload,
        };
        let bytes = self.codec.encode(&envelope)?;
        Ok(Message::Binary(bytes.into()))
    }
}

/// Fresh random nonce for one handshake, hex-formatted.
fn generate_nonce() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// The JSON content of a data frame, if it is one.
fn frame_bytes(msg: &Message) -> Option<Vec<u8>> {
    match msg {
        Message::Binary(data) => Some(data.to_vec()),
        Message::Text(text) => Some(text.as_bytes().to_vec()),
        _ => None,
    }
}

async fn run_session(
    id: SessionId,
    config: SessionConfig,
    actions: mpsc::UnboundedReceiver<ActionMessage>,
    events: mpsc::UnboundedSender<SessionEvent>,
    close_rx: oneshot::Receiver<()>,
) {
    tracing::debug!(%id, target = %config.target, "session task starting");
    let mut framer = Framer::new();

    let ws = match establish(&config, &mut framer, &events).await {
        Ok(ws) => ws,
        Err(err) => {
            tracing::debug!(%id, error = %err, "session establishment failed");
            let _ = events.send(SessionEvent::Errored {
                message: err.to_string(),
            });
            return;
        }
    };

    pump(id, ws, framer, actions, events, close_rx).await;
    tracing::debug!(%id, "session task finished");
}

/// Connect, handshake, and request world placement.
///
/// Emits `TransportOpen` itself (between ack and join request) so the
/// event ordering matches what actually happened on the wire.
async fn establish(
    config: &SessionConfig,
    framer: &mut Framer,
    events: &mpsc::UnboundedSender<SessionEvent>,
) -> Result<WsStream, ClientError> {
    let url = format!("ws://{}/session", config.target);

    let (mut ws, _response) =
        timeout(config.connect_timeout, tokio_tungstenite::connect_async(&url))
            .await
            .map_err(|_| ClientError::Timeout {
                phase: "connect",
                timeout: config.connect_timeout,
            })?
            .map_err(|source| ClientError::ConnectFailed {
                target: config.target.to_string(),
                source,
            })?;

    let handshake = SystemMessage::Handshake {
        protocol_version: PROTOCOL_VERSION,
        identity: config.identity.clone(),
        nonce: generate_nonce(),
        credential: config.credential.clone(),
    };
    ws.send(framer.frame(Payload::System(handshake))?)
        .await
        .map_err(|e| {
            ClientError::ConnectionClosed(format!(
                "handshake send failed: {e}"
            ))
        })?;

    let entity = timeout(config.handshake_timeout, await_ack(&mut ws))
        .await
        .map_err(|_| ClientError::Timeout {
            phase: "handshake",
            timeout: config.handshake_timeout,
        })??;

    let _ = events.send(SessionEvent::TransportOpen { entity });

    ws.send(framer.frame(Payload::System(SystemMessage::JoinWorld))?)
        .await
        .map_err(|e| {
            ClientError::ConnectionClosed(format!(
                "join request failed: {e}"
            ))
        })?;

    Ok(ws)
}

/// Reads frames until the handshake is acked or rejected.
async fn await_ack(ws: &mut WsStream) -> Result<EntityId, ClientError> {
    let codec = JsonCodec;
    loop {
        match ws.next().await {
            Some(Ok(msg)) => {
                if matches!(msg, Message::Close(_)) {
                    return Err(ClientError::ConnectionClosed(
                        "closed during handshake".into(),
                    ));
                }
                let Some(bytes) = frame_bytes(&msg) else {
                    continue; // ping/pong
                };
                let envelope: Envelope = codec.decode(&bytes)?;
                match envelope.payload {
                    Payload::System(SystemMessage::HandshakeAck {
                        entity,
                        motd,
                    }) => {
                        if entity == EntityId::PLACEHOLDER {
                            // Zero is reserved for synthetic actions; a
                            // gateway must never assign it.
                            return Err(
                                roost_protocol::ProtocolError::InvalidMessage(
                                    "ack assigned the reserved zero entity"
                                        .into(),
                                )
                                .into(),
                            );
                        }
                        if let Some(motd) = motd {
                            tracing::info!(%motd, "gateway greeting");
                        }
                        return Ok(entity);
                    }
                    Payload::System(SystemMessage::Error {
                        code,
                        message,
                    }) => {
                        return Err(ClientError::HandshakeRejected {
                            code,
                            message,
                        });
                    }
                    other => {
                        tracing::debug!(
                            ?other,
                            "ignoring frame before handshake ack"
                        );
                    }
                }
            }
            Some(Err(e)) => {
                return Err(ClientError::ConnectionClosed(e.to_string()));
            }
            None => {
                return Err(ClientError::ConnectionClosed(
                    "closed during handshake".into(),
                ));
            }
        }
    }
}

/// Steady-state frame pump. Exits on the first terminal condition,
/// emitting `TransportLost`/`Errored` as appropriate — or nothing at
/// all when the handle itself requested the close.
async fn pump(
    id: SessionId,
    mut ws: WsStream,
    mut framer: Framer,
    mut actions: mpsc::UnboundedReceiver<ActionMessage>,
    events: mpsc::UnboundedSender<SessionEvent>,
    mut close_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut close_rx => {
                // The handle is discarding this session. Flush a close
                // frame if the socket will take it; nobody is listening
                // for a verdict either way.
                let _ = ws.close(None).await;
                return;
            }

            action = actions.recv() => {
                let Some(action) = action else {
                    // Handle dropped without an explicit close.
                    let _ = ws.close(None).await;
                    return;
                };
                let msg = match framer.frame(Payload::Action(action)) {
                    Ok(msg) => msg,
                    Err(e) => {
                        let _ = events.send(SessionEvent::Errored {
                            message: format!("action encode failed: {e}"),
                        });
                        return;
                    }
                };
                if let Err(e) = ws.send(msg).await {
                    let _ = events.send(SessionEvent::TransportLost {
                        reason: format!("send failed: {e}"),
                    });
                    return;
                }
            }

            frame = ws.next() => match frame {
                Some(Ok(msg)) => {
                    if matches!(msg, Message::Close(_)) {
                        let _ = events.send(SessionEvent::TransportLost {
                            reason: "closed by gateway".into(),
                        });
                        return;
                    }
                    let Some(bytes) = frame_bytes(&msg) else {
                        continue; // ping/pong
                    };
                    let envelope: Envelope =
                        match framer.codec.decode(&bytes) {
                            Ok(envelope) => envelope,
                            Err(e) => {
                                // A malformed frame is dropped, not
                                // fatal to the session.
                                tracing::warn!(%id, error = %e, "dropping undecodable frame");
                                continue;
                            }
                        };
                    if let Some(event) = inbound_event(id, envelope) {
                        let terminal = event.is_terminal();
                        let _ = events.send(event);
                        if terminal {
                            return;
                        }
                    }
                }
                Some(Err(e)) => {
                    let _ = events.send(SessionEvent::TransportLost {
                        reason: e.to_string(),
                    });
                    return;
                }
                None => {
                    let _ = events.send(SessionEvent::TransportLost {
                        reason: "connection ended".into(),
                    });
                    return;
                }
            }
        }
    }
}

/// Maps an inbound envelope to a session event, if it produces one.
fn inbound_event(id: SessionId, envelope: Envelope) -> Option<SessionEvent> {
    match envelope.payload {
        Payload::System(SystemMessage::WorldJoined { world }) => {
            // Deliberately forwarded every time, duplicates included:
            // deduplication is the consumer's concern.
            Some(SessionEvent::WorldEntered { world })
        }
        Payload::System(SystemMessage::Notice { message }) => {
            tracing::debug!(%id, %message, "gateway notice");
            None
        }
        Payload::System(SystemMessage::Disconnect { reason }) => {
            Some(SessionEvent::TransportLost { reason })
        }
        Payload::System(SystemMessage::Error { code, message }) => {
            Some(SessionEvent::Errored {
                message: format!("gateway error {code}: {message}"),
            })
        }
        other => {
            tracing::debug!(%id, ?other, "ignoring unexpected frame");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Target;

    #[test]
    fn test_nonce_is_32_hex_chars_and_unique() {
        let a = generate_nonce();
        let b = generate_nonce();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_framer_increments_seq() {
        let mut framer = Framer::new();
        let first = framer.frame(Payload::System(SystemMessage::JoinWorld));
        let second = framer.frame(Payload::System(SystemMessage::JoinWorld));
        assert!(first.is_ok());
        assert!(second.is_ok());
        assert_eq!(framer.seq, 2);
    }

    #[tokio::test]
    async fn test_open_rejects_invalid_config_synchronously() {
        let config = SessionConfig::new(Target::new("gw.local", 1), "  ");
        let result = WsConnector.open(config);
        assert!(matches!(result, Err(ClientError::InvalidConfig(_))));
    }

    #[test]
    fn test_world_joined_maps_to_world_entered() {
        let envelope = Envelope {
            seq: 1,
            timestamp: 0,
            payload: Payload::System(SystemMessage::WorldJoined {
                world: "overworld".into(),
            }),
        };
        let event = inbound_event(SessionId::next(), envelope);
        assert_eq!(
            event,
            Some(SessionEvent::WorldEntered { world: "overworld".into() })
        );
    }

    #[test]
    fn test_notice_produces_no_event() {
        let envelope = Envelope {
            seq: 1,
            timestamp: 0,
            payload: Payload::System(SystemMessage::Notice {
                message: "restart in 5m".into(),
            }),
        };
        assert_eq!(inbound_event(SessionId::next(), envelope), None);
    }
}
