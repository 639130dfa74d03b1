//! Room lifecycle status and its atomic cell.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// The lifecycle state of a room.
///
/// Transitions are strictly ordered and each one happens at most once:
///
/// ```text
/// Init → Started → Closed
/// ```
///
/// - **Init**: the room exists and is filling up. Guests may enter.
/// - **Started**: the game is running. Only roster players may (re)enter.
/// - **Closed**: terminal. Every operation except `close` is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum RoomStatus {
    Init = 0,
    Started = 1,
    Closed = 2,
}

impl RoomStatus {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Init,
            1 => Self::Started,
            _ => Self::Closed,
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "Init"),
            Self::Started => write!(f, "Started"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

/// A shared atomic holding a [`RoomStatus`].
///
/// The status is the one piece of room state readable from outside the
/// actor, so it lives in an `Arc`'d atomic: the actor keeps one clone
/// inside [`BaseRoom`](crate::BaseRoom), handles keep another. All
/// transitions go through [`transition`](Self::transition), a
/// compare-and-swap, which is what makes start/close idempotent under
/// races between manual calls and scheduler timers.
#[derive(Debug, Clone)]
pub struct StatusCell(Arc<AtomicU8>);

impl StatusCell {
    /// A fresh cell in `Init`.
    pub fn new() -> Self {
        Self(Arc::new(AtomicU8::new(RoomStatus::Init as u8)))
    }

    /// The current status.
    pub fn load(&self) -> RoomStatus {
        RoomStatus::from_u8(self.0.load(Ordering::SeqCst))
    }

    /// Atomically moves `from` to `to`. Returns `true` iff this call
    /// performed the transition.
    pub fn transition(&self, from: RoomStatus, to: RoomStatus) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new()
    }
}
