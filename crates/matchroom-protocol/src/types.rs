//! Core protocol types for Matchroom's wire format.
//!
//! This module defines every structure that travels on the wire: the
//! request frames clients send, the replies the node writes back, the
//! cross-node kick record, and the immutable match description a room is
//! created from.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::fmt;

/// The pub/sub topic that carries cross-node kick records.
pub const KICK_TOPIC: &str = "game:kick";

// ---------------------------------------------------------------------------
// Match info
// ---------------------------------------------------------------------------

/// One participant slot in a match.
///
/// The set of `player_uid`s in [`MatchInfo::players`] decides who counts
/// as a player; any other uid entering a room is a guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// The player's user id.
    pub player_uid: i64,
    /// Team assignment, opaque to the room layer.
    pub camp: i32,
}

/// The immutable description a room is built from.
///
/// Produced by an external matchmaking service; the room layer never
/// mutates it and shares it behind an `Arc`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchInfo {
    /// The game this match belongs to.
    pub game_id: i64,
    /// The match id assigned by matchmaking.
    pub match_id: i64,
    /// Seconds to wait for a full lobby before auto-starting.
    /// Zero disables the auto-start timer.
    pub max_player_wait_time: u64,
    /// Seconds a started game may run before auto-closing.
    /// Zero disables the auto-close timer.
    pub max_game_time: u64,
    /// The full roster, in matchmaking order.
    pub players: Vec<Player>,
}

impl MatchInfo {
    /// Returns `true` if `uid` is on this match's roster.
    pub fn is_player(&self, uid: i64) -> bool {
        self.players.iter().any(|p| p.player_uid == uid)
    }
}

// ---------------------------------------------------------------------------
// Client request frames
// ---------------------------------------------------------------------------

/// The action a client requests on a room.
///
/// `#[serde(other)]` maps any unrecognized string onto `Unknown` instead
/// of failing the whole frame, so the node can answer with an
/// "unknown action" reply rather than silently dropping the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Enter the room (joins the default channel when a session is bound).
    Enter,
    /// Leave the room.
    Leave,
    /// Broadcast the frame's `data` on the room's default channel.
    Message,
    /// Anything the node does not understand.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enter => write!(f, "enter"),
            Self::Leave => write!(f, "leave"),
            Self::Message => write!(f, "message"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A request frame as decoded off a client connection.
///
/// `data` is kept as a raw JSON value: the node forwards it verbatim to
/// the room's default channel without re-encoding.
#[derive(Debug, Deserialize)]
pub struct ClientRequest {
    /// The room this request targets.
    pub room_id: i64,
    /// The user issuing the request. Values above zero also bind the
    /// session to this user before dispatch (trusted identity).
    pub uid: i64,
    /// What to do.
    pub action: Action,
    /// Opaque payload for `message` frames.
    #[serde(default)]
    pub data: Option<Box<RawValue>>,
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// Positive acknowledgement written back to the requesting session.
///
/// Wire shape: `{"status":"ok","action":"enter"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Always `"ok"`.
    pub status: String,
    /// The acknowledged action.
    pub action: Action,
}

impl Ack {
    /// Builds an acknowledgement for `action`.
    pub fn ok(action: Action) -> Self {
        Self {
            status: "ok".to_string(),
            action,
        }
    }
}

/// Error reply written back to the requesting session.
///
/// Wire shape: `{"error":"room 9 does not exist"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    /// Human-readable reason.
    pub error: String,
}

impl ErrorReply {
    /// Builds an error reply from anything displayable.
    pub fn new(message: impl fmt::Display) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Kick records
// ---------------------------------------------------------------------------

/// A cross-node eviction record published on [`KICK_TOPIC`].
///
/// Subscribers must ignore records whose `source_node` equals their own
/// node id, otherwise a node would evict the user it just admitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KickRecord {
    /// The user that joined a room on `source_node`.
    pub uid: i64,
    /// The node the user joined on.
    pub source_node: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_request_decodes_spec_frame() {
        let frame = br#"{"room_id":1,"uid":100,"action":"enter","data":null}"#;
        let req: ClientRequest = serde_json::from_slice(frame).unwrap();
        assert_eq!(req.room_id, 1);
        assert_eq!(req.uid, 100);
        assert_eq!(req.action, Action::Enter);
    }

    #[test]
    fn test_client_request_data_passes_through_verbatim() {
        let frame = br#"{"room_id":7,"uid":0,"action":"message","data":{"say":"hi"}}"#;
        let req: ClientRequest = serde_json::from_slice(frame).unwrap();
        assert_eq!(req.action, Action::Message);
        assert_eq!(req.data.unwrap().get(), r#"{"say":"hi"}"#);
    }

    #[test]
    fn test_unknown_action_maps_to_unknown_variant() {
        let frame = br#"{"room_id":1,"uid":1,"action":"dance"}"#;
        let req: ClientRequest = serde_json::from_slice(frame).unwrap();
        assert_eq!(req.action, Action::Unknown);
    }

    #[test]
    fn test_ack_wire_shape() {
        let bytes = serde_json::to_string(&Ack::ok(Action::Enter)).unwrap();
        assert_eq!(bytes, r#"{"status":"ok","action":"enter"}"#);
    }

    #[test]
    fn test_kick_record_wire_shape() {
        let record = KickRecord {
            uid: 500,
            source_node: "N2".to_string(),
        };
        let bytes = serde_json::to_string(&record).unwrap();
        assert_eq!(bytes, r#"{"uid":500,"source_node":"N2"}"#);
    }

    #[test]
    fn test_match_info_is_player() {
        let info = MatchInfo {
            players: vec![
                Player { player_uid: 100, camp: 0 },
                Player { player_uid: 200, camp: 1 },
            ],
            ..MatchInfo::default()
        };
        assert!(info.is_player(100));
        assert!(info.is_player(200));
        assert!(!info.is_player(999));
    }
}
