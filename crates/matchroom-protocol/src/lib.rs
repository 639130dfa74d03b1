//! Wire protocol for Matchroom.
//!
//! This crate defines the "language" that clients, nodes, and the kick
//! channel speak:
//!
//! - **Types** ([`ClientRequest`], [`Ack`], [`KickRecord`], [`MatchInfo`],
//!   etc.): the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those structures are
//!   converted to and from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong while encoding or
//!   decoding.
//!
//! The protocol layer sits below everything else. It does not know about
//! connections, rooms, or nodes; it only knows how to serialize and
//! deserialize messages.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Ack, Action, ClientRequest, ErrorReply, KickRecord, MatchInfo, Player,
    KICK_TOPIC,
};
