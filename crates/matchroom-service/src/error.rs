//! Error types for the room service.

use matchroom_room::ActorError;

/// Errors returned by [`RoomService`](crate::RoomService) operations.
///
/// Precondition failures surface to the transport as error replies;
/// mailbox errors from the underlying room actor pass through
/// transparently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// A room with this id is already registered.
    #[error("room {0} already exists")]
    RoomExists(i64),

    /// No room with this id is registered.
    #[error("room {0} does not exist")]
    RoomNotExist(i64),

    /// The room is not ready to start (already started, or no roster
    /// player has entered yet).
    #[error("room {0} is not ready to start")]
    RoomNotReady(i64),

    /// The room actor rejected the submission.
    #[error(transparent)]
    Actor(#[from] ActorError),
}
