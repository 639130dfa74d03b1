//! Pure room logic: membership, channels, and the lifecycle state machine.
//!
//! `BaseRoom` is deliberately not concurrency-safe. Every mutation is
//! meant to run on the owning [`RoomActor`](crate::RoomActor)'s worker;
//! only the status cell is shared outside.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use matchroom_protocol::MatchInfo;
use matchroom_session::{Session, SessionRef};

use crate::{Channel, RoomOptions, RoomStatus, StatusCell};

/// The name of the channel every session auto-joins on room entry: the
/// decimal room id.
pub fn default_channel_id(room_id: i64) -> String {
    room_id.to_string()
}

/// Membership, channels, and lifecycle state for one room.
pub struct BaseRoom {
    room_id: i64,
    match_info: Arc<MatchInfo>,
    status: StatusCell,
    members: HashSet<i64>,
    /// Count of members that are on the match roster. Kept incrementally;
    /// equals `members ∩ roster` whenever the actor mailbox is drained.
    player_count: i32,
    channels: HashMap<String, Channel>,
    options: RoomOptions,
}

impl BaseRoom {
    /// Creates a room in `Init` with no members and no channels.
    pub fn new(room_id: i64, match_info: Arc<MatchInfo>, options: RoomOptions) -> Self {
        Self {
            room_id,
            match_info,
            status: StatusCell::new(),
            members: HashSet::new(),
            player_count: 0,
            channels: HashMap::new(),
            options,
        }
    }

    /// The room's id.
    pub fn room_id(&self) -> i64 {
        self.room_id
    }

    /// The immutable match description this room was built from.
    pub fn match_info(&self) -> &Arc<MatchInfo> {
        &self.match_info
    }

    /// The current lifecycle status.
    pub fn status(&self) -> RoomStatus {
        self.status.load()
    }

    /// A shared handle to the status, readable from outside the actor.
    pub fn status_cell(&self) -> StatusCell {
        self.status.clone()
    }

    /// Number of members currently in the room.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Whether `uid` is currently a member.
    pub fn contains_member(&self, uid: i64) -> bool {
        self.members.contains(&uid)
    }

    /// Number of roster players currently in the room.
    pub fn player_count(&self) -> i32 {
        self.player_count
    }

    /// The named channel, if it exists.
    pub fn channel(&self, channel_id: &str) -> Option<&Channel> {
        self.channels.get(channel_id)
    }

    /// Whether the room is ready to auto-start: still in `Init` with at
    /// least one roster player present.
    pub fn check(&self) -> bool {
        self.status.load() == RoomStatus::Init && self.player_count > 0
    }

    /// Moves `Init` to `Started`. Returns `true` iff this call performed
    /// the transition; start hooks fire exactly then.
    pub fn start(&mut self) -> bool {
        if !self.status.transition(RoomStatus::Init, RoomStatus::Started) {
            return false;
        }
        tracing::info!(room_id = self.room_id, players = self.player_count, "room started");
        for hook in &self.options.room_hooks {
            hook.on_start(self.room_id);
        }
        true
    }

    /// Moves `Started` to `Closed` and drops all channels. Idempotent;
    /// close hooks fire only on the winning call. A room that never
    /// started keeps its `Init` status (the actor stopping is what makes
    /// it unusable).
    pub fn close(&mut self) {
        if !self.status.transition(RoomStatus::Started, RoomStatus::Closed) {
            return;
        }
        tracing::info!(room_id = self.room_id, "room closed");
        for hook in &self.options.room_hooks {
            hook.on_close(self.room_id);
        }
        self.channels.clear();
    }

    /// Admits `uid` into the room.
    ///
    /// A provided session always joins the default channel first (so a
    /// reconnect refreshes the stored session even for existing members).
    /// Guests are rejected once the room has left `Init`; roster players
    /// may enter at any point before close. Entering with the full roster
    /// present starts the room.
    pub fn user_enter_room(&mut self, uid: i64, room_id: i64, session: Option<SessionRef>) {
        if self.status.load() == RoomStatus::Closed {
            return;
        }
        if let Some(session) = session {
            self.join_channel(&default_channel_id(room_id), uid, session);
        }
        if self.members.contains(&uid) {
            return;
        }
        let is_player = self.match_info.is_player(uid);
        if self.status.load() != RoomStatus::Init && !is_player {
            tracing::debug!(room_id = self.room_id, uid, "guest rejected, room already started");
            return;
        }
        self.members.insert(uid);
        if is_player {
            self.player_count += 1;
        }
        for hook in &self.options.player_hooks {
            hook.on_enter(uid, is_player);
        }
        if is_player && self.player_count as usize == self.match_info.players.len() {
            self.start();
        }
    }

    /// Removes `uid` from the default channel and the member set.
    pub fn user_leave_room(&mut self, uid: i64, room_id: i64) {
        if self.status.load() == RoomStatus::Closed {
            return;
        }
        self.leave_channel(&default_channel_id(room_id), uid);
        let is_player = self.match_info.is_player(uid);
        if self.members.remove(&uid) && is_player {
            self.player_count -= 1;
        }
        for hook in &self.options.player_hooks {
            hook.on_leave(uid, is_player);
        }
    }

    /// Closes `uid`'s session on the default channel, then removes the
    /// user from the room.
    pub fn kick_user(&mut self, uid: i64) {
        if self.status.load() == RoomStatus::Closed {
            return;
        }
        let channel_id = default_channel_id(self.room_id);
        if let Some(session) = self.channels.get(&channel_id).and_then(|c| c.get_session(uid)) {
            tracing::info!(room_id = self.room_id, uid, "kicking user, closing session");
            session.close();
        }
        self.user_leave_room(uid, self.room_id);
    }

    /// Adds `uid`'s session to the named channel, creating the channel on
    /// first use.
    pub fn join_channel(&mut self, channel_id: &str, uid: i64, session: SessionRef) {
        if self.status.load() == RoomStatus::Closed {
            return;
        }
        self.channels
            .entry(channel_id.to_string())
            .or_insert_with(|| Channel::new(channel_id))
            .add(uid, session);
    }

    /// Removes `uid` from the named channel, if either exists.
    pub fn leave_channel(&mut self, channel_id: &str, uid: i64) {
        if self.status.load() == RoomStatus::Closed {
            return;
        }
        if let Some(channel) = self.channels.get_mut(channel_id) {
            channel.remove(uid);
        }
    }

    /// Broadcasts `msg` on the named channel. No-op for unknown channels.
    pub fn broadcast(&self, channel_id: &str, msg: &[u8]) {
        if self.status.load() == RoomStatus::Closed {
            return;
        }
        if let Some(channel) = self.channels.get(channel_id) {
            channel.broadcast(msg);
        }
    }
}
