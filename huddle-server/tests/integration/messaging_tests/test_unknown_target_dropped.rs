use huddle_core::{ClientSignal, PeerId};

use crate::integration::{create_test_room, init_tracing};
use crate::utils::{TestSession, sample_offer};

#[tokio::test]
async fn test_frame_for_departed_peer_is_dropped() {
    init_tracing();

    let room = create_test_room();

    let mut a = TestSession::join(&room).await.unwrap();
    a.snapshot().await.unwrap();
    let mut b = TestSession::join(&room).await.unwrap();
    b.snapshot().await.unwrap();
    a.drain().await;

    room.disconnect(b.peer_id).await.unwrap();
    a.drain().await;

    room.relay(
        a.peer_id,
        ClientSignal::Offer {
            to: b.peer_id,
            description: sample_offer(),
        },
    )
    .await
    .unwrap();
    room.relay(
        a.peer_id,
        ClientSignal::Offer {
            to: PeerId::new(),
            description: sample_offer(),
        },
    )
    .await
    .unwrap();

    // Room keeps serving after the misroutes.
    assert!(a.drain().await.is_empty());
    assert_eq!(room.members().await.unwrap(), vec![a.peer_id]);
}
