//! The kick bus: telling other nodes a user joined here.
//!
//! When a user enters a room on this node, a [`KickRecord`] is published
//! so every other node can evict that user from any room it still holds.
//! Delivery is best-effort by design: a missed record means the user is
//! transiently present on two nodes until their next enter event.

use matchroom_protocol::KickRecord;
use tokio::sync::broadcast;

/// A publisher of cross-node kick records.
///
/// `publish` must not block and must not fail loudly: implementations
/// log delivery problems and move on.
pub trait KickBus: Send + Sync + 'static {
    /// Publishes `record` to the kick topic.
    fn publish(&self, record: &KickRecord);
}

/// An in-process [`KickBus`] backed by a broadcast channel.
///
/// Used by tests and single-process deployments: every subscriber sees
/// every record, which is exactly the pub/sub contract the production
/// Redis bus provides across nodes.
pub struct LocalKickBus {
    tx: broadcast::Sender<KickRecord>,
}

impl LocalKickBus {
    /// Creates a bus with a bounded fan-out buffer.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    /// Opens a new subscription receiving every record published from
    /// now on.
    pub fn subscribe(&self) -> broadcast::Receiver<KickRecord> {
        self.tx.subscribe()
    }
}

impl Default for LocalKickBus {
    fn default() -> Self {
        Self::new()
    }
}

impl KickBus for LocalKickBus {
    fn publish(&self, record: &KickRecord) {
        // Send only fails when nobody is subscribed; best-effort either way.
        let _ = self.tx.send(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_subscriber_sees_the_record() {
        let bus = LocalKickBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        let record = KickRecord {
            uid: 500,
            source_node: "n1".to_string(),
        };
        bus.publish(&record);

        assert_eq!(first.recv().await.unwrap(), record);
        assert_eq!(second.recv().await.unwrap(), record);
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let bus = LocalKickBus::new();
        bus.publish(&KickRecord {
            uid: 1,
            source_node: "n1".to_string(),
        });
    }
}
