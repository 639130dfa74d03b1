//! Integration tests for request routing and cross-node eviction.

use std::sync::Arc;
use std::time::Duration;

use matchroom::prelude::*;
use matchroom_session::mock::MockSession;

// =========================================================================
// Helpers
// =========================================================================

fn new_service(node_id: &str, bus: Option<Arc<dyn KickBus>>) -> Arc<RoomService<RoomActor>> {
    let builder: Builder<RoomActor> =
        Box::new(|room_id, info| RoomActor::spawn(room_id, info, RoomOptions::new()));
    RoomService::new(node_id, builder, bus)
}

fn info(players: &[i64]) -> MatchInfo {
    MatchInfo {
        game_id: 1,
        match_id: 1,
        max_player_wait_time: 0,
        max_game_time: 0,
        players: players
            .iter()
            .map(|&uid| Player { player_uid: uid, camp: 0 })
            .collect(),
    }
}

async fn quiesce(service: &RoomService<RoomActor>, room_id: i64) {
    let room = service.get_room(room_id).expect("room exists");
    room.sync_invoke(|_| ()).await.expect("actor alive");
}

async fn wait_for(mut predicate: impl FnMut() -> bool) {
    for _ in 0..200 {
        if predicate() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

// =========================================================================
// Routing
// =========================================================================

#[tokio::test]
async fn test_enter_frame_acks_and_places_user() {
    let service = new_service("n1", None);
    service.create_room(1, info(&[100, 200])).unwrap();
    let router = RequestRouter::new(Arc::clone(&service));

    let mock = MockSession::new("c1");
    let sess = mock.as_session();
    router.handle(&sess, br#"{"room_id":1,"uid":100,"action":"enter"}"#);
    quiesce(&service, 1).await;

    assert_eq!(mock.user_id(), 100, "uid in the frame binds the session");
    assert_eq!(service.placement(100), Some(1));
    assert_eq!(
        mock.sent_text(),
        vec![r#"{"status":"ok","action":"enter"}"#.to_string()]
    );
}

#[tokio::test]
async fn test_leave_frame_acks_and_clears_placement() {
    let service = new_service("n1", None);
    service.create_room(1, info(&[100, 200])).unwrap();
    let router = RequestRouter::new(Arc::clone(&service));

    let mock = MockSession::new("c1");
    let sess = mock.as_session();
    router.handle(&sess, br#"{"room_id":1,"uid":100,"action":"enter"}"#);
    router.handle(&sess, br#"{"room_id":1,"uid":100,"action":"leave"}"#);
    quiesce(&service, 1).await;

    assert_eq!(service.placement(100), None);
    assert_eq!(
        mock.sent_text().last().unwrap(),
        r#"{"status":"ok","action":"leave"}"#
    );
}

#[tokio::test]
async fn test_enter_unknown_room_replies_error() {
    let service = new_service("n1", None);
    let router = RequestRouter::new(Arc::clone(&service));

    let mock = MockSession::new("c1");
    let sess = mock.as_session();
    router.handle(&sess, br#"{"room_id":9,"uid":100,"action":"enter"}"#);

    let reply: serde_json::Value = serde_json::from_str(&mock.sent_text()[0]).unwrap();
    assert!(reply["error"]
        .as_str()
        .unwrap()
        .contains("room 9 does not exist"));
}

#[tokio::test]
async fn test_unknown_action_replies_error() {
    let service = new_service("n1", None);
    let router = RequestRouter::new(Arc::clone(&service));

    let mock = MockSession::new("c1");
    let sess = mock.as_session();
    router.handle(&sess, br#"{"room_id":1,"uid":1,"action":"dance"}"#);

    assert_eq!(mock.sent_text(), vec![r#"{"error":"unknown action"}"#.to_string()]);
}

#[tokio::test]
async fn test_message_to_missing_room_replies_room_not_found() {
    let service = new_service("n1", None);
    let router = RequestRouter::new(Arc::clone(&service));

    let mock = MockSession::new("c1");
    let sess = mock.as_session();
    router.handle(&sess, br#"{"room_id":5,"uid":1,"action":"message","data":{"x":1}}"#);

    assert_eq!(mock.sent_text(), vec![r#"{"error":"room not found"}"#.to_string()]);
}

#[tokio::test]
async fn test_message_broadcasts_payload_verbatim() {
    let service = new_service("n1", None);
    service.create_room(7, info(&[1, 2])).unwrap();
    let router = RequestRouter::new(Arc::clone(&service));

    let alice = MockSession::new("alice");
    let bob = MockSession::new("bob");
    let alice_sess = alice.as_session();
    let bob_sess = bob.as_session();
    router.handle(&alice_sess, br#"{"room_id":7,"uid":1,"action":"enter"}"#);
    router.handle(&bob_sess, br#"{"room_id":7,"uid":2,"action":"enter"}"#);
    quiesce(&service, 7).await;

    router.handle(
        &alice_sess,
        br#"{"room_id":7,"uid":1,"action":"message","data":{"say":"hi"}}"#,
    );
    quiesce(&service, 7).await;

    // Both members (sender included) receive the raw payload.
    assert_eq!(alice.sent_text().last().unwrap(), r#"{"say":"hi"}"#);
    assert_eq!(bob.sent_text().last().unwrap(), r#"{"say":"hi"}"#);
}

#[tokio::test]
async fn test_malformed_frame_is_dropped_silently() {
    let service = new_service("n1", None);
    let router = RequestRouter::new(Arc::clone(&service));

    let mock = MockSession::new("c1");
    let sess = mock.as_session();
    router.handle(&sess, b"not json");
    router.handle(&sess, br#"{"room_id":"one","uid":1,"action":"enter"}"#);

    assert!(mock.sent().is_empty());
}

// =========================================================================
// Cross-node kicks
// =========================================================================

#[tokio::test]
async fn test_cross_node_kick_evicts_user_from_losing_node() {
    let bus = Arc::new(LocalKickBus::new());
    let n1 = new_service("N1", Some(Arc::clone(&bus) as _));
    let n2 = new_service("N2", Some(Arc::clone(&bus) as _));
    spawn_kick_listener("N1".to_string(), Arc::clone(&n1), bus.subscribe());
    spawn_kick_listener("N2".to_string(), Arc::clone(&n2), bus.subscribe());

    n1.create_room(7, info(&[500, 600])).unwrap();
    n2.create_room(9, info(&[500, 600])).unwrap();

    let sess = MockSession::new("s500-n1");
    n1.user_enter_room(500, 7, Some(sess.as_session())).unwrap();
    quiesce(&n1, 7).await;

    // N1's own publish must not evict the user it just admitted.
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(n1.placement(500), Some(7));

    // The user joins a room on N2; N1 must evict them.
    n2.user_enter_room(500, 9, None).unwrap();

    let n1_handle = Arc::clone(&n1);
    wait_for(move || n1_handle.placement(500).is_none()).await;
    let sess_handle = sess.clone();
    wait_for(move || sess_handle.is_closed()).await;

    quiesce(&n1, 7).await;
    let room7 = n1.get_room(7).unwrap();
    assert!(!room7.sync_invoke(|r| r.contains_member(500)).await.unwrap());
    assert_eq!(n2.placement(500), Some(9), "winning node keeps the user");
}

#[tokio::test]
async fn test_own_records_never_cause_self_kick() {
    let bus = Arc::new(LocalKickBus::new());
    let service = new_service("n1", Some(Arc::clone(&bus) as _));
    spawn_kick_listener("n1".to_string(), Arc::clone(&service), bus.subscribe());

    service.create_room(7, info(&[500, 600])).unwrap();
    let sess = MockSession::new("s500");
    service.user_enter_room(500, 7, Some(sess.as_session())).unwrap();
    quiesce(&service, 7).await;

    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(service.placement(500), Some(7));
    assert!(!sess.is_closed());
}
