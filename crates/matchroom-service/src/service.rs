//! The node-wide room service: registry, timers, and user placement.

use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use matchroom_protocol::{KickRecord, MatchInfo};
use matchroom_room::{GameRoom, RoomStatus};
use matchroom_session::SessionRef;
use matchroom_timer::JobScheduler;

use crate::{KickBus, ServiceError};

/// Builds a room object for the service. Injected at construction so a
/// game crate decides what actually backs a room (the stock
/// [`RoomActor`](matchroom_room::RoomActor), or its own wrapper).
pub type Builder<R> = Box<dyn Fn(i64, Arc<MatchInfo>) -> R + Send + Sync>;

/// Scheduler tag owned by everything belonging to one room.
fn room_tag(room_id: i64) -> String {
    format!("room-{room_id}")
}

/// Scheduler tag for a room's pending auto-start.
fn start_tag(room_id: i64) -> String {
    format!("room-{room_id}-start")
}

/// Scheduler tag for a room's pending auto-close.
fn close_tag(room_id: i64) -> String {
    format!("room-{room_id}-close")
}

/// The room registry and lifecycle coordinator for one node.
///
/// Concurrency model: the registry and the uid index are concurrent
/// maps, so any task may call into the service; per-room state stays
/// behind each room's own actor. Constructed behind an `Arc` because
/// scheduled timer jobs call back into the service.
pub struct RoomService<R: GameRoom> {
    rooms: DashMap<i64, Arc<R>>,
    /// uid to room id. One entry per user on this node; the local half
    /// of the single-room-per-user invariant.
    user_room: DashMap<i64, i64>,
    builder: Builder<R>,
    scheduler: JobScheduler,
    kick_bus: Option<Arc<dyn KickBus>>,
    node_id: String,
    /// Weak self-handle captured by scheduled jobs, so a pending timer
    /// never keeps a dropped service alive.
    self_ref: Weak<RoomService<R>>,
}

impl<R: GameRoom> RoomService<R> {
    /// Creates a service for a node.
    ///
    /// `kick_bus` is optional: a node without one simply never notifies
    /// other nodes (single-node deployment).
    pub fn new(
        node_id: impl Into<String>,
        builder: Builder<R>,
        kick_bus: Option<Arc<dyn KickBus>>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            rooms: DashMap::new(),
            user_room: DashMap::new(),
            builder,
            scheduler: JobScheduler::new(),
            kick_bus,
            node_id: node_id.into(),
            self_ref: self_ref.clone(),
        })
    }

    /// This node's identifier, as stamped into kick records.
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// The scheduler driving auto-start and auto-close timers.
    pub fn scheduler(&self) -> &JobScheduler {
        &self.scheduler
    }

    /// Registers and builds a new room.
    ///
    /// Registration is an atomic check-and-insert; a second creation for
    /// the same id fails with [`ServiceError::RoomExists`]. When the
    /// match allows a bounded lobby wait, the auto-start timer is armed
    /// here.
    pub fn create_room(&self, room_id: i64, match_info: MatchInfo) -> Result<Arc<R>, ServiceError> {
        let match_info = Arc::new(match_info);
        let room = match self.rooms.entry(room_id) {
            Entry::Occupied(_) => return Err(ServiceError::RoomExists(room_id)),
            Entry::Vacant(slot) => {
                let room = Arc::new((self.builder)(room_id, Arc::clone(&match_info)));
                slot.insert(Arc::clone(&room));
                room
            }
        };
        tracing::info!(room_id, players = match_info.players.len(), "room created");

        if match_info.max_player_wait_time > 0 {
            let service = self.self_ref.clone();
            self.scheduler.schedule_once(
                Duration::from_secs(match_info.max_player_wait_time),
                vec![room_tag(room_id), start_tag(room_id)],
                move || async move {
                    let Some(service) = service.upgrade() else {
                        return;
                    };
                    if let Err(error) = service.start_room(room_id).await {
                        tracing::debug!(room_id, %error, "auto-start did not run");
                    }
                },
            );
        }

        Ok(room)
    }

    /// Looks up a room by id.
    pub fn get_room(&self, room_id: i64) -> Option<Arc<R>> {
        self.rooms.get(&room_id).map(|room| Arc::clone(&room))
    }

    /// Starts a room, manually or from the auto-start timer.
    ///
    /// The pending auto-start job is cancelled first so a manual call
    /// preempts the timer; the room's status CAS keeps the operation
    /// idempotent if both race anyway. Starting also arms the auto-close
    /// timer when the match bounds game time.
    pub async fn start_room(&self, room_id: i64) -> Result<(), ServiceError> {
        let room = self
            .get_room(room_id)
            .ok_or(ServiceError::RoomNotExist(room_id))?;

        self.scheduler.cancel_tag(&start_tag(room_id));

        if !room.check().await {
            return Err(ServiceError::RoomNotReady(room_id));
        }
        if room.start().await? {
            self.arm_auto_close(room_id, room.match_info().max_game_time);
        }
        Ok(())
    }

    /// Arms the auto-close timer for a room that just started.
    ///
    /// Guarded so a manual start racing a roster-full start does not
    /// stack timers; a lost race at worst produces a second close job
    /// whose `close_room` finds the room already gone.
    fn arm_auto_close(&self, room_id: i64, max_game_time: u64) {
        if max_game_time == 0 {
            return;
        }
        let tag = close_tag(room_id);
        if self.scheduler.pending_tagged(&tag) > 0 {
            return;
        }
        if !self.rooms.contains_key(&room_id) {
            return;
        }
        let service = self.self_ref.clone();
        self.scheduler.schedule_once(
            Duration::from_secs(max_game_time),
            vec![room_tag(room_id), tag],
            move || async move {
                let Some(service) = service.upgrade() else {
                    return;
                };
                if let Err(error) = service.close_room(room_id).await {
                    tracing::debug!(room_id, %error, "auto-close did not run");
                }
            },
        );
    }

    /// Closes a room: cancels its timers, removes it from the registry,
    /// then waits for the room's own close barrier.
    ///
    /// The registry entry goes away before the barrier completes, so new
    /// lookups fail immediately while already-enqueued room work drains.
    pub async fn close_room(&self, room_id: i64) -> Result<(), ServiceError> {
        let (_, room) = self
            .rooms
            .remove(&room_id)
            .ok_or(ServiceError::RoomNotExist(room_id))?;
        self.scheduler.cancel_tag(&room_tag(room_id));
        tracing::info!(room_id, "room closing");
        room.close().await;
        Ok(())
    }

    /// Places `uid` into a room, enforcing one room per user.
    ///
    /// If the user is already somewhere else on this node they leave
    /// that room first; other nodes learn about the move through the
    /// kick bus. The enter itself is a mailbox submission; when it may
    /// complete the roster, a follow-up task waits for it to execute and
    /// arms the auto-close timer if the room started.
    pub fn user_enter_room(
        &self,
        uid: i64,
        room_id: i64,
        session: Option<SessionRef>,
    ) -> Result<(), ServiceError> {
        let room = self
            .get_room(room_id)
            .ok_or(ServiceError::RoomNotExist(room_id))?;

        match self.user_room.get(&uid).map(|entry| *entry) {
            Some(current) if current == room_id => {}
            Some(current) => {
                if let Some(old_room) = self.get_room(current) {
                    if let Err(error) = old_room.user_leave_room(uid, current) {
                        tracing::warn!(uid, room_id = current, %error, "leave of previous room failed");
                    }
                }
                self.user_room.insert(uid, room_id);
            }
            None => {
                self.user_room.insert(uid, room_id);
            }
        }

        if let Some(bus) = &self.kick_bus {
            bus.publish(&KickRecord {
                uid,
                source_node: self.node_id.clone(),
            });
        }

        let armed_before = room.status() == RoomStatus::Started;
        room.user_enter_room(uid, room_id, session)?;

        // A roster-full enter starts the room inside the actor, where no
        // timer can be armed. Observe the transition after the enter has
        // actually executed (check() doubles as the mailbox barrier).
        let max_game_time = room.match_info().max_game_time;
        if !armed_before && max_game_time > 0 {
            let service = self.self_ref.clone();
            tokio::spawn(async move {
                let _ = room.check().await;
                if room.status() == RoomStatus::Started {
                    if let Some(service) = service.upgrade() {
                        service.arm_auto_close(room_id, max_game_time);
                    }
                }
            });
        }
        Ok(())
    }

    /// Removes `uid` from a room and drops the placement entry if it
    /// still points at that room.
    pub fn user_leave_room(&self, uid: i64, room_id: i64) -> Result<(), ServiceError> {
        let room = self
            .get_room(room_id)
            .ok_or(ServiceError::RoomNotExist(room_id))?;
        room.user_leave_room(uid, room_id)?;
        self.user_room.remove_if(&uid, |_, current| *current == room_id);
        Ok(())
    }

    /// Evicts `uid` from whatever room this node has them in. This is
    /// the handler for kick records arriving from other nodes.
    ///
    /// Always clears the placement entry, even when the mapped room is
    /// already gone.
    pub fn kick_user(&self, uid: i64) {
        let Some((_, room_id)) = self.user_room.remove(&uid) else {
            return;
        };
        match self.get_room(room_id) {
            Some(room) => {
                if let Err(error) = room.kick_user(uid) {
                    tracing::debug!(uid, room_id, %error, "kick submission failed");
                }
            }
            None => {
                tracing::debug!(uid, room_id, "kick found no such room, entry cleared");
            }
        }
    }

    /// The room this node currently places `uid` in, if any.
    pub fn placement(&self, uid: i64) -> Option<i64> {
        self.user_room.get(&uid).map(|entry| *entry)
    }

    /// Number of registered rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
