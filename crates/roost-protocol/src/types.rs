//! Core types for the roost gateway wire format.
//!
//! Everything here travels on the wire as a JSON text frame. The shapes
//! are a contract with the gateway: a field rename on either side is a
//! protocol break, which is why the serde attributes below are pinned
//! down by tests.

use serde::{Deserialize, Serialize};

use std::fmt;

/// Protocol revision sent in every [`SystemMessage::Handshake`].
///
/// The gateway rejects mismatched clients with an `Error { code: 426 }`
/// rather than guessing at compatibility.
pub const PROTOCOL_VERSION: u16 = 1;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A server-assigned entity identifier.
///
/// Newtype over `u64` so an entity id can't be confused with a sequence
/// number or timestamp in a signature. `#[serde(transparent)]` keeps the
/// wire form a plain number: `EntityId(42)` serializes as `42`.
///
/// `EntityId::PLACEHOLDER` (zero) is the subject used for synthetic
/// keep-alive actions, where no real entity is being addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl EntityId {
    /// The zero id used when an action has no meaningful subject.
    pub const PLACEHOLDER: EntityId = EntityId(0);
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Positions and actions
// ---------------------------------------------------------------------------

/// A world-space position carried by action messages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    /// The origin. Keep-alive actions always use this.
    pub const ZERO: Position = Position { x: 0.0, y: 0.0, z: 0.0 };
}

/// The kind of transient action an [`ActionMessage`] carries.
///
/// `rename_all = "snake_case"` puts `"start_sneak"` / `"stop_sneak"`
/// on the wire, matching the gateway's action vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Begin a transient action (crouch start).
    StartSneak,
    /// End the transient action begun by the matching `StartSneak`.
    StopSneak,
}

/// Client → Server: a player action inside the world.
///
/// The keep-alive path sends these purely to look alive: subject is
/// [`EntityId::PLACEHOLDER`], position is [`Position::ZERO`], and the
/// server is expected to treat the pair as a no-op. `face` is part of
/// the action vocabulary (which block face the action targets) and is
/// always 0 for synthetic traffic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionMessage {
    pub entity: EntityId,
    pub kind: ActionKind,
    pub position: Position,
    pub face: i32,
}

impl ActionMessage {
    /// The synthetic "begin" half of a keep-alive pair.
    pub fn sneak_begin() -> Self {
        ActionMessage {
            entity: EntityId::PLACEHOLDER,
            kind: ActionKind::StartSneak,
            position: Position::ZERO,
            face: 0,
        }
    }

    /// The synthetic "end" half of a keep-alive pair.
    pub fn sneak_end() -> Self {
        ActionMessage {
            entity: EntityId::PLACEHOLDER,
            kind: ActionKind::StopSneak,
            position: Position::ZERO,
            face: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// SystemMessage: session plumbing
// ---------------------------------------------------------------------------

/// Messages that manage the session itself rather than in-world play.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
///   `{ "type": "Handshake", "protocol_version": 1, ... }`
/// which keeps the frames self-describing for anything watching the
/// wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemMessage {
    // -- Session establishment --

    /// Client → Server: opening message of every session.
    ///
    /// `identity` is the display name to present in-world. `nonce` is a
    /// fresh random value per session so the gateway can tell a
    /// reconnect from a duplicate. `credential` is required by gateways
    /// running token auth and absent in offline mode.
    Handshake {
        protocol_version: u16,
        identity: String,
        nonce: String,
        credential: Option<String>,
    },

    /// Server → Client: handshake accepted; the transport is now open.
    ///
    /// `entity` is the id the server assigned to this client's presence.
    HandshakeAck {
        entity: EntityId,
        motd: Option<String>,
    },

    /// Client → Server: request placement into the world.
    JoinWorld,

    /// Server → Client: the client's presence is live in `world`.
    ///
    /// Gateways may resend this for an already-joined session (after an
    /// in-world transfer, for instance). Receivers must tolerate
    /// duplicates.
    WorldJoined { world: String },

    /// Server → Client: free-text server notice. Informational only.
    Notice { message: String },

    /// Either direction: the sender is ending the session.
    Disconnect { reason: String },

    /// Server → Client: the last client message was rejected.
    ///
    /// `code` follows HTTP conventions (401 bad credential, 426
    /// protocol version mismatch, ...).
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Payload and Envelope
// ---------------------------------------------------------------------------

/// The content of a frame: session plumbing or an in-world action.
///
/// `#[serde(tag = "type", content = "data")]` gives adjacently tagged
/// JSON, e.g. `{ "type": "System", "data": { "type": "JoinWorld" } }`,
/// so a reader can route on the outer tag without parsing the inner
/// message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    /// Session management (handshake, join, disconnect, ...).
    System(SystemMessage),

    /// An in-world player action.
    Action(ActionMessage),
}

/// The top-level wire frame. Every message on the wire is an Envelope.
///
/// ```text
/// ┌──────────────────────────────────┐
/// │ seq: 7                           │  ← per-sender ordering
/// │ timestamp: 4200                  │  ← ms since the session opened
/// │ ┌──────────────────────────────┐ │
/// │ │ payload: Action(start_sneak) │ │  ← the actual content
/// │ └──────────────────────────────┘ │
/// └──────────────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Auto-incrementing per-sender sequence number.
    pub seq: u64,

    /// Milliseconds since the sender opened this session.
    pub timestamp: u64,

    /// The actual message content.
    pub payload: Payload,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The gateway contract defines exact JSON shapes. These tests pin
    //! the serde attributes down so a refactor can't silently change
    //! the wire format.

    use super::*;

    fn as_json<T: serde::Serialize>(value: &T) -> serde_json::Value {
        serde_json::to_value(value).unwrap()
    }

    // =====================================================================
    // Identity and action types
    // =====================================================================

    #[test]
    fn test_entity_id_serializes_as_plain_number() {
        // `#[serde(transparent)]` means EntityId(17) → `17`, not {"0":17}.
        let json = serde_json::to_string(&EntityId(17)).unwrap();
        assert_eq!(json, "17");
    }

    #[test]
    fn test_entity_id_display() {
        assert_eq!(EntityId(7).to_string(), "E-7");
    }

    #[test]
    fn test_action_kind_serializes_as_snake_case() {
        let json = serde_json::to_string(&ActionKind::StartSneak).unwrap();
        assert_eq!(json, "\"start_sneak\"");

        let json = serde_json::to_string(&ActionKind::StopSneak).unwrap();
        assert_eq!(json, "\"stop_sneak\"");
    }

    #[test]
    fn test_sneak_pair_uses_placeholder_subject_and_origin() {
        // Keep-alive traffic must not reference a real entity or place.
        let begin = ActionMessage::sneak_begin();
        assert_eq!(begin.entity, EntityId::PLACEHOLDER);
        assert_eq!(begin.position, Position::ZERO);
        assert_eq!(begin.face, 0);
        assert_eq!(begin.kind, ActionKind::StartSneak);

        let end = ActionMessage::sneak_end();
        assert_eq!(end.entity, EntityId::PLACEHOLDER);
        assert_eq!(end.kind, ActionKind::StopSneak);
    }

    #[test]
    fn test_action_message_flattens_to_wire_fields() {
        let json = as_json(&ActionMessage::sneak_begin());

        assert_eq!(json["entity"], 0);
        assert_eq!(json["kind"], "start_sneak");
        assert_eq!(json["position"]["x"], 0.0);
        assert_eq!(json["face"], 0);
    }

    // =====================================================================
    // SystemMessage shapes
    // =====================================================================

    #[test]
    fn test_handshake_is_internally_tagged() {
        // Internally tagged:
        //   { "type": "Handshake", "protocol_version": 1, ... }
        let hello = SystemMessage::Handshake {
            protocol_version: PROTOCOL_VERSION,
            identity: "roost".into(),
            nonce: "a1b2".into(),
            credential: Some("tok".into()),
        };
        let json = as_json(&hello);

        assert_eq!(json["type"], "Handshake");
        assert_eq!(json["protocol_version"], 1);
        assert_eq!(json["identity"], "roost");
        assert_eq!(json["nonce"], "a1b2");
        assert_eq!(json["credential"], "tok");
    }

    #[test]
    fn test_handshake_without_credential() {
        // Offline mode sends no credential: `None` becomes `null`.
        let hello = SystemMessage::Handshake {
            protocol_version: PROTOCOL_VERSION,
            identity: "roost".into(),
            nonce: "a1b2".into(),
            credential: None,
        };
        assert!(as_json(&hello)["credential"].is_null());
    }

    #[test]
    fn test_handshake_ack_carries_entity_and_motd() {
        let ack = SystemMessage::HandshakeAck {
            entity: EntityId(9),
            motd: Some("welcome".into()),
        };
        let json = as_json(&ack);

        assert_eq!(json["type"], "HandshakeAck");
        assert_eq!(json["entity"], 9);
        assert_eq!(json["motd"], "welcome");
    }

    #[test]
    fn test_world_joined_decodes_from_gateway_json() {
        // Exactly what a gateway puts on the wire.
        let wire = r#"{"type": "WorldJoined", "world": "overworld"}"#;
        let decoded: SystemMessage = serde_json::from_str(wire).unwrap();
        assert_eq!(
            decoded,
            SystemMessage::WorldJoined { world: "overworld".into() }
        );
    }

    #[test]
    fn test_error_carries_code_and_message() {
        let rejection = SystemMessage::Error {
            code: 426,
            message: "protocol version unsupported".into(),
        };
        let json = as_json(&rejection);

        assert_eq!(json["type"], "Error");
        assert_eq!(json["code"], 426);
        assert_eq!(json["message"], "protocol version unsupported");
    }

    // =====================================================================
    // Payload and Envelope
    // =====================================================================

    #[test]
    fn test_payload_wraps_system_in_adjacent_tags() {
        // Adjacently tagged: { "type": "System", "data": { ... } }
        let json = as_json(&Payload::System(SystemMessage::JoinWorld));

        assert_eq!(json["type"], "System");
        assert_eq!(json["data"]["type"], "JoinWorld");
    }

    #[test]
    fn test_payload_wraps_action_in_adjacent_tags() {
        let json = as_json(&Payload::Action(ActionMessage::sneak_end()));

        assert_eq!(json["type"], "Action");
        assert_eq!(json["data"]["kind"], "stop_sneak");
    }

    #[test]
    fn test_envelope_survives_the_wire() {
        let frame = Envelope {
            seq: 7,
            timestamp: 4200,
            payload: Payload::Action(ActionMessage::sneak_begin()),
        };
        let bytes = serde_json::to_vec(&frame).unwrap();
        let back: Envelope = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(frame, back);
    }

    // =====================================================================
    // Error cases: malformed input
    // =====================================================================

    #[test]
    fn test_garbage_bytes_are_rejected() {
        let junk: &[u8] = b"\x1b[31mnot a frame\x1b[0m";
        assert!(serde_json::from_slice::<Envelope>(junk).is_err());
    }

    #[test]
    fn test_missing_fields_are_rejected() {
        // Valid JSON, but missing every required envelope field.
        let partial = r#"{"world": "overworld"}"#;
        assert!(serde_json::from_str::<Envelope>(partial).is_err());
    }

    #[test]
    fn test_unknown_message_type_is_rejected() {
        let bogus = r#"{"type": "GrowWings", "span": 12}"#;
        assert!(serde_json::from_str::<SystemMessage>(bogus).is_err());
    }
}
