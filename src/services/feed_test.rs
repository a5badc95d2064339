use super::*;
use crate::state::test_helpers;
use tokio::time::{Duration, timeout};

async fn recv(rx: &mut mpsc::Receiver<Frame>) -> Frame {
    timeout(Duration::from_millis(200), rx.recv())
        .await
        .expect("frame receive timed out")
        .expect("channel closed")
}

#[tokio::test]
async fn publish_reaches_every_client() {
    let state = test_helpers::test_app_state();
    let (_, mut rx_a) = test_helpers::attach_feed_client(&state).await;
    let (_, mut rx_b) = test_helpers::attach_feed_client(&state).await;

    publish(&state, &notice_deleted_frame("1")).await;

    for rx in [&mut rx_a, &mut rx_b] {
        let frame = recv(rx).await;
        assert_eq!(frame.syscall, SYSCALL_NOTICE_DELETED);
        assert_eq!(frame.data.get("id").and_then(|v| v.as_str()), Some("1"));
    }
}

#[tokio::test]
async fn unregister_stops_delivery() {
    let state = test_helpers::test_app_state();
    let client_id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::channel(4);
    register(&state, client_id, tx).await;
    unregister(&state, client_id).await;

    publish(&state, &notice_deleted_frame("1")).await;
    assert!(rx.recv().await.is_none(), "sender should be dropped on unregister");
}

#[tokio::test]
async fn full_channel_is_skipped_without_blocking() {
    let state = test_helpers::test_app_state();
    let (tx, mut rx) = mpsc::channel(1);
    register(&state, Uuid::new_v4(), tx).await;

    publish(&state, &notice_deleted_frame("a")).await;
    timeout(Duration::from_millis(200), publish(&state, &notice_deleted_frame("b")))
        .await
        .expect("publish must not block on a full channel");

    assert_eq!(recv(&mut rx).await.data.get("id").and_then(|v| v.as_str()), Some("a"));
}

#[test]
fn notice_created_frame_embeds_notice() {
    let frame = notice_created_frame(&test_helpers::notice("9", "Fire Drill"));
    assert_eq!(frame.syscall, SYSCALL_NOTICE_CREATED);
    assert_eq!(frame.data["notice"]["title"], "Fire Drill");
}
