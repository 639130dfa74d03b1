//! # Matchroom
//!
//! A single-node game-room server: many concurrent rooms, each behind
//! its own single-writer actor, coordinated by a node-wide room service
//! that enforces one room per user and evicts users across nodes over a
//! shared kick channel.
//!
//! This meta crate ties the layers together: transport frames are
//! decoded by the [`RequestRouter`] and dispatched to the room service;
//! [`GameNode`] wires the service, the WebSocket server, and the kick
//! bus into a runnable node.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use matchroom::prelude::*;
//!
//! # async fn run() -> Result<(), MatchroomError> {
//! let builder: Builder<RoomActor> =
//!     Box::new(|room_id, info| RoomActor::spawn(room_id, info, RoomOptions::new()));
//! let node = GameNode::new(NodeConfig::default(), builder).await?;
//! node.run().await
//! # }
//! ```

mod error;
mod node;
mod redis_bus;

pub use error::MatchroomError;
pub use node::{spawn_kick_listener, GameNode, NodeConfig, RequestRouter};
pub use redis_bus::{spawn_redis_kick_listener, RedisKickBus};

/// Re-exports everything a server embedder needs.
pub mod prelude {
    // Meta-crate
    pub use crate::{
        spawn_kick_listener, spawn_redis_kick_listener, GameNode, MatchroomError, NodeConfig,
        RedisKickBus, RequestRouter,
    };

    // Protocol types
    pub use matchroom_protocol::{
        Ack, Action, ClientRequest, Codec, ErrorReply, JsonCodec, KickRecord, MatchInfo, Player,
        ProtocolError, KICK_TOPIC,
    };

    // Session types
    pub use matchroom_session::{Session, SessionError, SessionRef};

    // Room types
    pub use matchroom_room::{
        default_channel_id, ActorError, BaseRoom, GameRoom, PlayerLifecycleHook, RoomActor,
        RoomLifecycleHook, RoomOptions, RoomStatus,
    };

    // Service types
    pub use matchroom_service::{Builder, KickBus, LocalKickBus, RoomService, ServiceError};

    // Timer types
    pub use matchroom_timer::{JobId, JobScheduler};

    // Transport types
    pub use matchroom_transport::{ConnectionHandler, TransportError, WsServer, WsSession};
}
