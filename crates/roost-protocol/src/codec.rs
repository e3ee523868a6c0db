//! Codec seam between wire types and raw frame bytes.
//!
//! The session layer never serializes anything itself; it goes through
//! [`Codec`]. Today the gateway speaks JSON text frames, so [`JsonCodec`]
//! is the only implementation, but a binary codec can slot in without
//! touching session code.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Converts between wire types and raw bytes.
///
/// `Send + Sync + 'static` because codecs live inside long-running
/// session tasks. The methods are generic so the same codec handles
/// envelopes, bare system messages in tests, and anything else serde
/// can see. `DeserializeOwned` (rather than `Deserialize<'de>`) means
/// decoded values own their data and the input buffer can be dropped.
pub trait Codec: Send + Sync + 'static {
    /// Encodes a value into frame bytes.
    ///
    /// # Errors
    /// `ProtocolError::Encode` when the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Decodes frame bytes back into a value.
    ///
    /// # Errors
    /// `ProtocolError::Decode` when the bytes are malformed, truncated,
    /// or the wrong shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// Behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use roost_protocol::{
///     ActionMessage, Codec, Envelope, JsonCodec, Payload,
/// };
///
/// let codec = JsonCodec;
/// let frame = Envelope {
///     seq: 3,
///     timestamp: 1200,
///     payload: Payload::Action(ActionMessage::sneak_end()),
/// };
///
/// let bytes = codec.encode(&frame).unwrap();
/// let back: Envelope = codec.decode(&bytes).unwrap();
/// assert_eq!(frame, back);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
