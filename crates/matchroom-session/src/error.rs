//! Error types for the session layer.

/// Errors a [`Session::send`](crate::Session::send) can fail with.
///
/// Senders treat both variants as best-effort failures: a broadcast logs
/// and moves on to the next session, it never aborts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The session has been closed (client disconnected or kicked).
    #[error("session closed")]
    Closed,

    /// The session's outbound buffer is full. The client is reading too
    /// slowly; the message is dropped rather than blocking the caller.
    #[error("session send buffer full")]
    Backpressure,
}
