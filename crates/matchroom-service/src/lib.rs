//! The Matchroom room service.
//!
//! One [`RoomService`] per node: it owns the room registry, the
//! uid-to-room index that enforces "one room per user on this node", the
//! lifecycle timers (auto-start, auto-close), and kick publication so
//! other nodes evict a user who joined here.

mod error;
mod kick;
mod service;

pub use error::ServiceError;
pub use kick::{KickBus, LocalKickBus};
pub use service::{Builder, RoomService};
