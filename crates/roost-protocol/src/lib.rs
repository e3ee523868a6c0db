//! Wire protocol for the roost gateway.
//!
//! This crate defines the language the client speaks to a game-world
//! gateway:
//!
//! - **Types** ([`Envelope`], [`SystemMessage`], [`ActionMessage`]) —
//!   the frames that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those frames are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong doing so.
//!
//! # Layering
//!
//! The protocol layer sits below the session client: it knows about
//! frames, not about connections, retries, or lifecycle state.
//!
//! ```text
//! WebSocket (bytes) → Protocol (Envelope) → Session client (events)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ActionKind, ActionMessage, Envelope, EntityId, Payload, Position,
    SystemMessage, PROTOCOL_VERSION,
};
