//! The [`Session`] trait: the server's view of one connected client.

use std::sync::Arc;

use crate::SessionError;

/// A shared handle to a live session.
///
/// Cheap to clone; rooms store these in channels, the transport keeps the
/// owning side. Dropping every `SessionRef` does not close the underlying
/// connection, only [`Session::close`] (or the client going away) does.
pub type SessionRef = Arc<dyn Session>;

/// One connected client, as seen by the room layer.
///
/// Implementations must serialize their own `send`/`close` internally:
/// a session is shared between the transport's reader task, the room it
/// joins, and the kick subscriber, all of which may call into it
/// concurrently.
pub trait Session: Send + Sync + 'static {
    /// A stable identifier for the connection's lifetime.
    fn id(&self) -> &str;

    /// The user currently bound to this session, or zero if unbound.
    fn user_id(&self) -> i64;

    /// Binds a user to this session. Later bindings overwrite earlier
    /// ones; identity is trusted input on each request.
    fn set_user_id(&self, uid: i64);

    /// Queues `msg` for delivery to the client.
    ///
    /// Must not block beyond a bounded buffer enqueue: the actual network
    /// write happens on the session's own writer task. Fails fast with
    /// [`SessionError::Backpressure`] when the buffer is full and
    /// [`SessionError::Closed`] after close.
    fn send(&self, msg: &[u8]) -> Result<(), SessionError>;

    /// Closes the session. Idempotent; queued messages may still flush.
    fn close(&self);
}
