//! The `GameRoom` trait: the room surface the service builds against.

use std::future::Future;
use std::sync::Arc;

use matchroom_protocol::MatchInfo;
use matchroom_session::SessionRef;

use crate::{ActorError, RoomStatus};

/// The contract a room object offers the room service.
///
/// [`RoomActor`](crate::RoomActor) is the stock implementation; game
/// crates can wrap it (or replace it) and hand their own type to the
/// service through its builder. Mutating operations are fire-and-forget
/// mailbox submissions; only `check`, `start`, and `close` wait on the
/// worker.
///
/// The waiting methods return `impl Future + Send` (rather than plain
/// `async fn`) because the service schedules them onto spawned tasks.
pub trait GameRoom: Send + Sync + 'static {
    /// The room's id.
    fn room_id(&self) -> i64;

    /// The match description the room was built from.
    fn match_info(&self) -> Arc<MatchInfo>;

    /// The current lifecycle status. May be read from any task.
    fn status(&self) -> RoomStatus;

    /// Whether the room is ready to start: still `Init` with at least
    /// one roster player present. Runs on the room's worker so the
    /// answer reflects a quiescent point.
    fn check(&self) -> impl Future<Output = bool> + Send;

    /// Performs the `Init` to `Started` transition on the room's worker.
    /// Resolves to `true` iff this call won the status CAS; repeated
    /// calls are idempotent.
    fn start(&self) -> impl Future<Output = Result<bool, ActorError>> + Send;

    /// Closes the room, waiting for in-flight work, and stops its
    /// worker.
    fn close(&self) -> impl Future<Output = ()> + Send;

    /// Admits `uid`, joining the provided session to the default channel.
    fn user_enter_room(
        &self,
        uid: i64,
        room_id: i64,
        session: Option<SessionRef>,
    ) -> Result<(), ActorError>;

    /// Removes `uid` from the room and its default channel.
    fn user_leave_room(&self, uid: i64, room_id: i64) -> Result<(), ActorError>;

    /// Closes `uid`'s session and removes the user.
    fn kick_user(&self, uid: i64) -> Result<(), ActorError>;

    /// Adds `uid`'s session to an arbitrary named channel.
    fn join_channel(&self, channel_id: &str, uid: i64, session: SessionRef)
        -> Result<(), ActorError>;

    /// Removes `uid` from a named channel.
    fn leave_channel(&self, channel_id: &str, uid: i64) -> Result<(), ActorError>;

    /// Broadcasts `msg` on a named channel. Unknown channels are a no-op.
    fn broadcast(&self, channel_id: &str, msg: Vec<u8>) -> Result<(), ActorError>;
}
