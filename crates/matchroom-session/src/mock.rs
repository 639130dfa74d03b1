//! An in-memory [`Session`] for tests.
//!
//! Records every sent message instead of writing to a socket, so tests
//! across the workspace can assert on broadcast contents and close
//! behavior without a network.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{Session, SessionError, SessionRef};

/// A [`Session`] that captures outbound messages in memory.
///
/// Cheap to clone; clones share the same buffers, so a test keeps one
/// handle for assertions while the room holds another.
#[derive(Clone)]
pub struct MockSession {
    inner: Arc<Inner>,
}

struct Inner {
    id: String,
    uid: AtomicI64,
    closed: AtomicBool,
    sent: Mutex<Vec<Vec<u8>>>,
}

impl MockSession {
    /// Creates a mock session with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: id.into(),
                uid: AtomicI64::new(0),
                closed: AtomicBool::new(false),
                sent: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Everything sent so far, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.inner.sent.lock().clone()
    }

    /// The sent messages decoded as UTF-8 strings, for JSON assertions.
    pub fn sent_text(&self) -> Vec<String> {
        self.inner
            .sent
            .lock()
            .iter()
            .map(|m| String::from_utf8_lossy(m).into_owned())
            .collect()
    }

    /// Whether [`Session::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Upcasts to the trait object the room layer works with. The
    /// returned handle shares this mock's state.
    pub fn as_session(&self) -> SessionRef {
        Arc::new(self.clone())
    }
}

impl Session for MockSession {
    fn id(&self) -> &str {
        &self.inner.id
    }

    fn user_id(&self) -> i64 {
        self.inner.uid.load(Ordering::SeqCst)
    }

    fn set_user_id(&self, uid: i64) {
        self.inner.uid.store(uid, Ordering::SeqCst);
    }

    fn send(&self, msg: &[u8]) -> Result<(), SessionError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(SessionError::Closed);
        }
        self.inner.sent.lock().push(msg.to_vec());
        Ok(())
    }

    fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
    }
}
