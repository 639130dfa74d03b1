//! A named group of sessions inside one room, used for broadcasting.

use std::collections::HashMap;

use matchroom_session::{Session, SessionRef};

/// A channel: uid to session entries with best-effort broadcast.
///
/// Channels are owned by their [`BaseRoom`](crate::BaseRoom) and only
/// touched from the room actor, so a plain `HashMap` is enough; no lock
/// of its own.
pub struct Channel {
    id: String,
    sessions: HashMap<i64, SessionRef>,
}

impl Channel {
    /// Creates an empty channel.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sessions: HashMap::new(),
        }
    }

    /// The channel's name.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Adds (or replaces) the session for `uid`.
    ///
    /// Last writer wins on purpose: a reconnecting client's new session
    /// displaces the stale one.
    pub fn add(&mut self, uid: i64, session: SessionRef) {
        self.sessions.insert(uid, session);
    }

    /// The session for `uid`, if any.
    pub fn get_session(&self, uid: i64) -> Option<SessionRef> {
        self.sessions.get(&uid).cloned()
    }

    /// Removes `uid`. Idempotent.
    pub fn remove(&mut self, uid: i64) {
        self.sessions.remove(&uid);
    }

    /// Whether `uid` has a session in this channel.
    pub fn contains(&self, uid: i64) -> bool {
        self.sessions.contains_key(&uid)
    }

    /// Number of sessions in the channel.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the channel has no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Sends `msg` to every session in the channel.
    ///
    /// A failed send (closed session, full buffer) is logged and skipped;
    /// it never aborts delivery to the remaining sessions.
    pub fn broadcast(&self, msg: &[u8]) {
        for (uid, session) in &self.sessions {
            if let Err(error) = session.send(msg) {
                tracing::debug!(
                    channel = %self.id,
                    uid,
                    %error,
                    "skipping session during broadcast"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchroom_session::mock::MockSession;

    #[test]
    fn test_add_overwrites_existing_entry() {
        let mut channel = Channel::new("1");
        let first = MockSession::new("a");
        let second = MockSession::new("b");
        channel.add(7, first.as_session());
        channel.add(7, second.as_session());

        assert_eq!(channel.len(), 1);
        let current = channel.get_session(7).unwrap();
        assert_eq!(current.id(), "b");
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut channel = Channel::new("1");
        let sess = MockSession::new("a");
        channel.add(7, sess.as_session());
        channel.remove(7);
        channel.remove(7);
        assert!(channel.is_empty());
    }

    #[test]
    fn test_broadcast_skips_failed_sessions() {
        let mut channel = Channel::new("1");
        let healthy = MockSession::new("a");
        let dead = MockSession::new("b");
        dead.close();
        channel.add(1, healthy.as_session());
        channel.add(2, dead.as_session());

        channel.broadcast(b"hello");

        assert_eq!(healthy.sent(), vec![b"hello".to_vec()]);
        assert!(dead.sent().is_empty());
    }
}
