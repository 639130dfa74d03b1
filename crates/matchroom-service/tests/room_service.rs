//! Integration tests for the room service: registry, placement, and the
//! lifecycle timers.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use matchroom_protocol::{MatchInfo, Player};
use matchroom_room::{GameRoom, RoomActor, RoomLifecycleHook, RoomOptions, RoomStatus};
use matchroom_service::{Builder, KickBus, LocalKickBus, RoomService, ServiceError};
use matchroom_session::mock::MockSession;

// =========================================================================
// Helpers
// =========================================================================

#[derive(Default)]
struct LifecycleCounts {
    starts: AtomicU32,
    closes: AtomicU32,
}

impl RoomLifecycleHook for LifecycleCounts {
    fn on_start(&self, _room_id: i64) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_close(&self, _room_id: i64) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

fn service_with_counts(
    bus: Option<Arc<dyn KickBus>>,
) -> (Arc<RoomService<RoomActor>>, Arc<LifecycleCounts>) {
    let counts = Arc::new(LifecycleCounts::default());
    let hook = Arc::clone(&counts);
    let builder: Builder<RoomActor> = Box::new(move |room_id, info| {
        RoomActor::spawn(
            room_id,
            info,
            RoomOptions::new().with_room_hook(Arc::clone(&hook) as _),
        )
    });
    (RoomService::new("n1", builder, bus), counts)
}

fn info(players: &[i64], wait_secs: u64, game_secs: u64) -> MatchInfo {
    MatchInfo {
        game_id: 1,
        match_id: 1,
        max_player_wait_time: wait_secs,
        max_game_time: game_secs,
        players: players
            .iter()
            .map(|&uid| Player { player_uid: uid, camp: 0 })
            .collect(),
    }
}

/// Drains the given room's mailbox.
async fn quiesce(service: &RoomService<RoomActor>, room_id: i64) {
    let room = service.get_room(room_id).expect("room exists");
    room.sync_invoke(|_| ()).await.expect("actor alive");
}

/// Polls until `predicate` holds or the budget runs out.
async fn wait_for(mut predicate: impl FnMut() -> bool) {
    for _ in 0..100 {
        if predicate() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

// =========================================================================
// Registry
// =========================================================================

#[tokio::test]
async fn test_create_room_rejects_duplicate_ids() {
    let (service, _) = service_with_counts(None);
    service.create_room(1, info(&[], 0, 0)).unwrap();
    assert_eq!(
        service.create_room(1, info(&[], 0, 0)).unwrap_err(),
        ServiceError::RoomExists(1)
    );
    assert_eq!(service.room_count(), 1);
}

#[tokio::test]
async fn test_enter_missing_room_errors() {
    let (service, _) = service_with_counts(None);
    assert_eq!(
        service.user_enter_room(1, 99, None).unwrap_err(),
        ServiceError::RoomNotExist(99)
    );
}

// =========================================================================
// Placement (one room per user)
// =========================================================================

#[tokio::test]
async fn test_enter_places_user_and_joins_default_channel() {
    let (service, _) = service_with_counts(None);
    service.create_room(1, info(&[100, 200], 0, 0)).unwrap();

    let sess = MockSession::new("a");
    service.user_enter_room(100, 1, Some(sess.as_session())).unwrap();
    quiesce(&service, 1).await;

    assert_eq!(service.placement(100), Some(1));
    let room = service.get_room(1).unwrap();
    let in_channel = room
        .sync_invoke(|r| r.channel("1").map(|c| c.contains(100)).unwrap_or(false))
        .await
        .unwrap();
    assert!(in_channel);
}

#[tokio::test]
async fn test_self_move_between_local_rooms() {
    let (service, _) = service_with_counts(None);
    service.create_room(1, info(&[42, 777], 0, 0)).unwrap();
    service.create_room(2, info(&[42, 777], 0, 0)).unwrap();

    let sess = MockSession::new("x");
    service.user_enter_room(42, 1, Some(sess.as_session())).unwrap();
    quiesce(&service, 1).await;

    service.user_enter_room(42, 2, Some(sess.as_session())).unwrap();
    quiesce(&service, 1).await;
    quiesce(&service, 2).await;

    assert_eq!(service.placement(42), Some(2));
    let room1 = service.get_room(1).unwrap();
    let room2 = service.get_room(2).unwrap();
    assert!(!room1.sync_invoke(|r| r.contains_member(42)).await.unwrap());
    assert!(room2.sync_invoke(|r| r.contains_member(42)).await.unwrap());
}

#[tokio::test]
async fn test_reentering_same_room_keeps_placement() {
    let (service, _) = service_with_counts(None);
    service.create_room(1, info(&[42, 777], 0, 0)).unwrap();

    service.user_enter_room(42, 1, None).unwrap();
    service.user_enter_room(42, 1, None).unwrap();
    quiesce(&service, 1).await;

    assert_eq!(service.placement(42), Some(1));
    let room = service.get_room(1).unwrap();
    assert_eq!(room.sync_invoke(|r| r.member_count()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_leave_clears_placement_only_for_matching_room() {
    let (service, _) = service_with_counts(None);
    service.create_room(1, info(&[42, 777], 0, 0)).unwrap();
    service.create_room(2, info(&[42, 777], 0, 0)).unwrap();

    service.user_enter_room(42, 2, None).unwrap();
    // Leaving a room the user is not placed in must not clear the entry.
    service.user_leave_room(42, 1).unwrap();
    assert_eq!(service.placement(42), Some(2));

    service.user_leave_room(42, 2).unwrap();
    assert_eq!(service.placement(42), None);
}

// =========================================================================
// Lifecycle timers
// =========================================================================

#[tokio::test]
async fn test_full_roster_start_arms_auto_close() {
    let (service, counts) = service_with_counts(None);
    service.create_room(1, info(&[100, 200], 60, 300)).unwrap();

    let a = MockSession::new("a");
    let b = MockSession::new("b");
    service.user_enter_room(100, 1, Some(a.as_session())).unwrap();
    service.user_enter_room(200, 1, Some(b.as_session())).unwrap();
    quiesce(&service, 1).await;

    let room = service.get_room(1).unwrap();
    assert_eq!(room.status(), RoomStatus::Started);
    assert_eq!(counts.starts.load(Ordering::SeqCst), 1);

    let scheduler = service.scheduler().clone();
    wait_for(move || scheduler.pending_tagged("room-1-close") == 1).await;
}

#[tokio::test]
async fn test_timed_auto_start_with_partial_lobby() {
    let (service, counts) = service_with_counts(None);
    service.create_room(2, info(&[100, 200], 1, 0)).unwrap();
    service.user_enter_room(100, 2, None).unwrap();
    quiesce(&service, 2).await;

    let room = service.get_room(2).unwrap();
    assert_eq!(room.status(), RoomStatus::Init);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(room.status(), RoomStatus::Started);
    assert_eq!(counts.starts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_auto_start_skips_room_without_players() {
    let (service, counts) = service_with_counts(None);
    service.create_room(3, info(&[100, 200], 1, 0)).unwrap();

    tokio::time::sleep(Duration::from_millis(1400)).await;

    let room = service.get_room(3).expect("not-ready room stays registered");
    assert_eq!(room.status(), RoomStatus::Init);
    assert_eq!(counts.starts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_manual_start_preempts_auto_start_timer() {
    let (service, counts) = service_with_counts(None);
    service.create_room(4, info(&[100, 200], 60, 300)).unwrap();
    service.user_enter_room(100, 4, None).unwrap();
    quiesce(&service, 4).await;

    service.start_room(4).await.unwrap();

    assert_eq!(service.scheduler().pending_tagged("room-4-start"), 0);
    assert_eq!(service.scheduler().pending_tagged("room-4-close"), 1);
    assert_eq!(counts.starts.load(Ordering::SeqCst), 1);

    // Started rooms are no longer ready; a second start is rejected
    // without re-firing hooks.
    assert_eq!(
        service.start_room(4).await.unwrap_err(),
        ServiceError::RoomNotReady(4)
    );
    assert_eq!(counts.starts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_close_room_cancels_pending_timers() {
    let (service, counts) = service_with_counts(None);
    service.create_room(3, info(&[100, 200], 1, 300)).unwrap();
    service.user_enter_room(100, 3, None).unwrap();
    quiesce(&service, 3).await;

    service.close_room(3).await.unwrap();

    assert!(service.get_room(3).is_none());
    assert_eq!(service.scheduler().pending(), 0);

    tokio::time::sleep(Duration::from_millis(1300)).await;
    assert_eq!(counts.starts.load(Ordering::SeqCst), 0, "start never fires");
    assert_eq!(counts.closes.load(Ordering::SeqCst), 0, "never-started room fires no close hook");
}

#[tokio::test]
async fn test_close_room_fires_close_hook_for_started_room() {
    let (service, counts) = service_with_counts(None);
    service.create_room(5, info(&[100], 0, 0)).unwrap();
    service.user_enter_room(100, 5, None).unwrap();
    quiesce(&service, 5).await;
    assert_eq!(counts.starts.load(Ordering::SeqCst), 1);

    service.close_room(5).await.unwrap();
    assert_eq!(counts.closes.load(Ordering::SeqCst), 1);
    assert_eq!(
        service.close_room(5).await.unwrap_err(),
        ServiceError::RoomNotExist(5)
    );
}

#[tokio::test]
async fn test_auto_close_after_game_time() {
    let (service, counts) = service_with_counts(None);
    service.create_room(6, info(&[100], 0, 1)).unwrap();
    service.user_enter_room(100, 6, None).unwrap();
    quiesce(&service, 6).await;
    assert_eq!(counts.starts.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_millis(1600)).await;

    assert!(service.get_room(6).is_none(), "auto-close removed the room");
    assert_eq!(counts.closes.load(Ordering::SeqCst), 1);
}

// =========================================================================
// Kicks
// =========================================================================

#[tokio::test]
async fn test_kick_user_closes_session_and_clears_placement() {
    let (service, _) = service_with_counts(None);
    service.create_room(7, info(&[500, 777], 0, 0)).unwrap();
    let sess = MockSession::new("s500");
    service.user_enter_room(500, 7, Some(sess.as_session())).unwrap();
    quiesce(&service, 7).await;

    service.kick_user(500);
    quiesce(&service, 7).await;

    assert!(sess.is_closed());
    assert_eq!(service.placement(500), None);
    let room = service.get_room(7).unwrap();
    assert!(!room.sync_invoke(|r| r.contains_member(500)).await.unwrap());
}

#[tokio::test]
async fn test_kick_user_with_vanished_room_still_clears_placement() {
    let (service, _) = service_with_counts(None);
    service.create_room(8, info(&[500, 777], 0, 0)).unwrap();
    service.user_enter_room(500, 8, None).unwrap();
    service.close_room(8).await.unwrap();

    service.kick_user(500);
    assert_eq!(service.placement(500), None);
}

#[tokio::test]
async fn test_enter_publishes_kick_record_with_node_id() {
    let bus = Arc::new(LocalKickBus::new());
    let mut records = bus.subscribe();
    let (service, _) = service_with_counts(Some(Arc::clone(&bus) as _));

    service.create_room(9, info(&[500, 777], 0, 0)).unwrap();
    service.user_enter_room(500, 9, None).unwrap();

    let record = records.recv().await.unwrap();
    assert_eq!(record.uid, 500);
    assert_eq!(record.source_node, "n1");
}
