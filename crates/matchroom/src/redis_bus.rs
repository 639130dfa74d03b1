//! Redis-backed kick bus.
//!
//! Production nodes share a Redis instance; every enter publishes a
//! [`KickRecord`] to the kick topic and every node subscribes to it.
//! Publishing goes through a queue to a dedicated task so the enter path
//! never blocks on Redis I/O, and failures on either side are logged and
//! dropped (the bus is best-effort by contract).

use std::sync::Arc;

use futures_util::StreamExt;
use matchroom_protocol::{Codec, JsonCodec, KickRecord, KICK_TOPIC};
use matchroom_room::GameRoom;
use matchroom_service::{KickBus, RoomService};
use tokio::sync::mpsc;

/// A [`KickBus`] publishing to a Redis pub/sub topic.
pub struct RedisKickBus {
    outbound: mpsc::UnboundedSender<KickRecord>,
}

impl RedisKickBus {
    /// Connects to Redis and spawns the publisher task.
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        let (outbound, mut queued) = mpsc::unbounded_channel::<KickRecord>();

        tokio::spawn(async move {
            let codec = JsonCodec;
            while let Some(record) = queued.recv().await {
                let payload = match codec.encode(&record) {
                    Ok(payload) => payload,
                    Err(error) => {
                        tracing::warn!(%error, "kick record encode failed");
                        continue;
                    }
                };
                let published: redis::RedisResult<i64> =
                    redis::AsyncCommands::publish(&mut conn, KICK_TOPIC, payload).await;
                if let Err(error) = published {
                    tracing::warn!(uid = record.uid, %error, "kick publish failed");
                }
            }
        });

        Ok(Self { outbound })
    }
}

impl KickBus for RedisKickBus {
    fn publish(&self, record: &KickRecord) {
        // Hand off to the publisher task; the enter path never waits.
        let _ = self.outbound.send(record.clone());
    }
}

/// Subscribes to the kick topic and evicts users admitted elsewhere.
///
/// Malformed records are skipped with a warning, and records published
/// by this node itself are ignored.
pub async fn spawn_redis_kick_listener<R: GameRoom>(
    url: &str,
    node_id: String,
    service: Arc<RoomService<R>>,
) -> Result<tokio::task::JoinHandle<()>, redis::RedisError> {
    let client = redis::Client::open(url)?;
    let mut pubsub = client.get_async_pubsub().await?;
    pubsub.subscribe(KICK_TOPIC).await?;

    Ok(tokio::spawn(async move {
        let codec = JsonCodec;
        let mut messages = pubsub.on_message();
        while let Some(message) = messages.next().await {
            let payload: Vec<u8> = match message.get_payload() {
                Ok(payload) => payload,
                Err(error) => {
                    tracing::warn!(%error, "unreadable kick payload");
                    continue;
                }
            };
            let record: KickRecord = match codec.decode(&payload) {
                Ok(record) => record,
                Err(error) => {
                    tracing::warn!(%error, "malformed kick record skipped");
                    continue;
                }
            };
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
    }))
}
