use huddle_core::RelaySignal;

use crate::integration::{create_test_room, init_tracing};
use crate::utils::TestSession;

#[tokio::test]
async fn test_three_peers_join() {
    init_tracing();

    let room = create_test_room();

    let mut a = TestSession::join(&room).await.unwrap();
    let a_snapshot = a.snapshot().await.unwrap();

    let mut b = TestSession::join(&room).await.unwrap();
    let b_snapshot = b.snapshot().await.unwrap();

    let mut c = TestSession::join(&room).await.unwrap();
    let c_snapshot = c.snapshot().await.unwrap();

    assert!(a_snapshot.is_empty());
    assert_eq!(b_snapshot, vec![a.peer_id]);
    assert_eq!(c_snapshot, vec![a.peer_id, b.peer_id]);

    let a_frames = a.drain().await;
    assert_eq!(
        a_frames,
        vec![
            RelaySignal::UserJoined(b.peer_id),
            RelaySignal::UserJoined(c.peer_id)
        ]
    );

    let b_frames = b.drain().await;
    assert_eq!(b_frames, vec![RelaySignal::UserJoined(c.peer_id)]);

    assert!(c.drain().await.is_empty());
}
