//! What can go wrong between frames and bytes.

/// Errors from encoding or decoding wire frames.
///
/// A `ProtocolError` always means the bytes and the types disagree,
/// never that the network failed — transport faults live in the client
/// crate's error type.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The value could not be serialized.
    #[cfg(feature = "json")]
    #[error("could not encode frame: {0}")]
    Encode(serde_json::Error),

    /// The bytes were malformed, truncated, or matched no known shape.
    #[cfg(feature = "json")]
    #[error("could not decode frame: {0}")]
    Decode(serde_json::Error),

    /// The frame parsed but violates a protocol rule — e.g. a
    /// handshake carrying protocol version 0.
    #[error("invalid frame: {0}")]
    InvalidMessage(String),
}
