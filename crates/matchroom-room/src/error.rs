//! Error types for the room layer.

/// Errors from submitting work to a room actor's mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ActorError {
    /// The actor has been closed; its worker no longer drains the mailbox.
    #[error("room actor stopped")]
    Stopped,

    /// The bounded mailbox is full. Submission fails fast rather than
    /// blocking the caller.
    #[error("room actor mailbox full")]
    MailboxFull,
}
