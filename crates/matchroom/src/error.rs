//! Unified error type for the Matchroom meta crate.

use matchroom_protocol::ProtocolError;
use matchroom_service::ServiceError;
use matchroom_transport::TransportError;

/// Top-level error wrapping every layer-specific error.
///
/// Embedders of the meta crate deal with this single type; the `#[from]`
/// attributes let `?` convert layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum MatchroomError {
    /// A transport-level error (bind, accept).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A room-service error (registry preconditions, actor mailbox).
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// An encode/decode error.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A Redis error from the kick bus.
    #[error(transparent)]
    Redis(#[from] redis::RedisError),
}
