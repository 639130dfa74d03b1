//! Node glue: request routing and the runnable game node.
//!
//! The flow for every client frame is
//!
//! ```text
//! transport → RequestRouter → RoomService → room actor → channel → session
//! ```
//!
//! and for cross-node coordination
//!
//! ```text
//! enter here → kick bus publish → other node's listener → kick_user
//! ```

use std::sync::Arc;

use matchroom_protocol::{Ack, Action, ClientRequest, Codec, ErrorReply, JsonCodec, KickRecord};
use matchroom_room::{default_channel_id, GameRoom};
use matchroom_service::{Builder, KickBus, RoomService};
use matchroom_session::{Session, SessionRef};
use matchroom_transport::{ConnectionHandler, WsServer};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::redis_bus::{spawn_redis_kick_listener, RedisKickBus};
use crate::MatchroomError;

// ---------------------------------------------------------------------------
// RequestRouter
// ---------------------------------------------------------------------------

/// Decodes client request frames and dispatches them to the room service.
///
/// This is the transport's [`ConnectionHandler`]; it is also usable
/// directly (`handle`) without a socket, which is how the tests drive it.
pub struct RequestRouter<R: GameRoom> {
    service: Arc<RoomService<R>>,
    codec: JsonCodec,
}

impl<R: GameRoom> RequestRouter<R> {
    /// Creates a router for the given service.
    pub fn new(service: Arc<RoomService<R>>) -> Self {
        Self {
            service,
            codec: JsonCodec,
        }
    }

    /// Routes one raw frame from `session`.
    ///
    /// Malformed frames are dropped with a log line; everything else
    /// gets either an acknowledgement or an error reply.
    pub fn handle(&self, session: &SessionRef, data: &[u8]) {
        let request: ClientRequest = match self.codec.decode(data) {
            Ok(request) => request,
            Err(error) => {
                tracing::debug!(session = session.id(), %error, "dropping malformed frame");
                return;
            }
        };

        // Trusted identity: a positive uid binds the session.
        if request.uid > 0 {
            session.set_user_id(request.uid);
        }

        tracing::debug!(
            session = session.id(),
            action = %request.action,
            room_id = request.room_id,
            uid = request.uid,
            "request"
        );

        match request.action {
            Action::Enter => {
                let result = self.service.user_enter_room(
                    request.uid,
                    request.room_id,
                    Some(Arc::clone(session)),
                );
                match result {
                    Ok(()) => self.reply(session, &Ack::ok(Action::Enter)),
                    Err(error) => self.reply(session, &ErrorReply::new(&error)),
                }
            }

            Action::Leave => match self.service.user_leave_room(request.uid, request.room_id) {
                Ok(()) => self.reply(session, &Ack::ok(Action::Leave)),
                Err(error) => self.reply(session, &ErrorReply::new(&error)),
            },

            Action::Message => match self.service.get_room(request.room_id) {
                Some(room) => {
                    let payload = request
                        .data
                        .map(|data| data.get().as_bytes().to_vec())
                        .unwrap_or_default();
                    let channel = default_channel_id(request.room_id);
                    if let Err(error) = room.broadcast(&channel, payload) {
                        tracing::debug!(room_id = request.room_id, %error, "broadcast rejected");
                        self.reply(session, &ErrorReply::new(&error));
                    }
                }
                None => self.reply(session, &ErrorReply::new("room not found")),
            },

            Action::Unknown => self.reply(session, &ErrorReply::new("unknown action")),
        }
    }

    /// Encodes and sends a reply; send failures are logged and dropped.
    fn reply<T: Serialize>(&self, session: &SessionRef, message: &T) {
        let bytes = match self.codec.encode(message) {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::warn!(%error, "encoding reply failed");
                return;
            }
        };
        if let Err(error) = session.send(&bytes) {
            tracing::debug!(session = session.id(), %error, "reply dropped");
        }
    }
}

impl<R: GameRoom> ConnectionHandler for RequestRouter<R> {
    fn on_connect(&self, session: &SessionRef) {
        tracing::info!(session = session.id(), "session connected");
    }

    fn on_message(&self, session: &SessionRef, data: Vec<u8>) {
        self.handle(session, &data);
    }

    fn on_close(&self, session: &SessionRef) {
        tracing::info!(session = session.id(), uid = session.user_id(), "session closed");
    }
}

// ---------------------------------------------------------------------------
// Kick listener
// ---------------------------------------------------------------------------

/// Consumes kick records from an in-process bus subscription and evicts
/// the named users locally.
///
/// Records originating from this node are ignored: the node that just
/// admitted a user must not evict them again.
pub fn spawn_kick_listener<R: GameRoom>(
    node_id: String,
    service: Arc<RoomService<R>>,
    mut records: broadcast::Receiver<KickRecord>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match records.recv().await {
                Ok(record) => {
                    if record.source_node == node_id {
                        continue;
                    }
                    tracing::info!(
                        uid = record.uid,
                        source = %record.source_node,
                        "kick record received"
                    );
                    service.kick_user(record.uid);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "kick listener lagged, records lost");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

// ---------------------------------------------------------------------------
// GameNode
// ---------------------------------------------------------------------------

/// Configuration for one node process.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Identifier stamped into outgoing kick records.
    pub node_id: String,
    /// Listen host for the client transport.
    pub host: String,
    /// Listen port for the client transport.
    pub port: u16,
    /// Redis URL for the cross-node kick bus; `None` runs single-node.
    pub redis_url: Option<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: "node-1".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8080,
            redis_url: None,
        }
    }
}

/// A runnable game node: room service plus transport plus kick wiring.
pub struct GameNode<R: GameRoom> {
    config: NodeConfig,
    service: Arc<RoomService<R>>,
}

impl<R: GameRoom> GameNode<R> {
    /// Builds a node around an explicit kick bus (or none). No I/O.
    pub fn with_kick_bus(
        config: NodeConfig,
        builder: Builder<R>,
        bus: Option<Arc<dyn KickBus>>,
    ) -> Self {
        let service = RoomService::new(config.node_id.clone(), builder, bus);
        Self { config, service }
    }

    /// Builds a node, connecting the Redis kick bus when configured.
    ///
    /// With a `redis_url`, both halves are wired: enters publish to the
    /// kick topic, and a subscriber task evicts users other nodes admit.
    pub async fn new(config: NodeConfig, builder: Builder<R>) -> Result<Self, MatchroomError> {
        match config.redis_url.clone() {
            Some(url) => {
                let bus = RedisKickBus::connect(&url).await?;
                let node = Self::with_kick_bus(config, builder, Some(Arc::new(bus)));
                spawn_redis_kick_listener(
                    &url,
                    node.config.node_id.clone(),
                    Arc::clone(&node.service),
                )
                .await?;
                Ok(node)
            }
            None => Ok(Self::with_kick_bus(config, builder, None)),
        }
    }

    /// The node's room service.
    pub fn service(&self) -> &Arc<RoomService<R>> {
        &self.service
    }

    /// The node's configuration.
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Binds the transport and serves clients until the process ends.
    pub async fn run(self) -> Result<(), MatchroomError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let server = WsServer::bind(&addr).await?;
        let router = Arc::new(RequestRouter::new(Arc::clone(&self.service)));
        tracing::info!(node = %self.config.node_id, %addr, "node serving");
        server.run(router).await?;
        Ok(())
    }
}
