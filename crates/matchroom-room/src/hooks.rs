//! Lifecycle hooks: small capability records a room is created with.
//!
//! There is no deep listener hierarchy; a room carries two ordered lists
//! of hooks and calls them synchronously on its actor. Game rules attach
//! here.

use std::sync::Arc;

/// Observes a room starting and closing.
pub trait RoomLifecycleHook: Send + Sync + 'static {
    /// The room's status moved to `Started`. Fires at most once per room.
    fn on_start(&self, room_id: i64);

    /// The room's status moved to `Closed`. Fires at most once per room.
    fn on_close(&self, room_id: i64);
}

/// Observes users entering and leaving a room.
pub trait PlayerLifecycleHook: Send + Sync + 'static {
    /// `uid` became a member. `is_player` is whether the uid is on the
    /// match roster (as opposed to a guest).
    fn on_enter(&self, uid: i64, is_player: bool);

    /// `uid` left (or was kicked from) the room.
    fn on_leave(&self, uid: i64, is_player: bool);
}

/// The hook set handed to a room at creation time.
///
/// Hooks run in registration order on the room actor; a hook must not
/// call back into the same actor synchronously.
#[derive(Clone, Default)]
pub struct RoomOptions {
    pub(crate) room_hooks: Vec<Arc<dyn RoomLifecycleHook>>,
    pub(crate) player_hooks: Vec<Arc<dyn PlayerLifecycleHook>>,
}

impl RoomOptions {
    /// An empty hook set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a room lifecycle hook.
    pub fn with_room_hook(mut self, hook: Arc<dyn RoomLifecycleHook>) -> Self {
        self.room_hooks.push(hook);
        self
    }

    /// Appends a player lifecycle hook.
    pub fn with_player_hook(mut self, hook: Arc<dyn PlayerLifecycleHook>) -> Self {
        self.player_hooks.push(hook);
        self
    }
}
