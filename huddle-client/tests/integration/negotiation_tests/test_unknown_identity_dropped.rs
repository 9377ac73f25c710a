use huddle_core::{PeerId, RelaySignal, SessionDescription};

use crate::integration::init_tracing;
use crate::utils::{EngineHarness, candidate, drain, recv_within, test_config};

#[tokio::test(start_paused = true)]
async fn test_frames_from_unknown_peers_are_dropped() {
    init_tracing();

    let mut h = EngineHarness::start(test_config()).await;
    h.join(&[]);

    let stranger = PeerId::new();
    h.signal(RelaySignal::Offer {
        from: stranger,
        description: SessionDescription::offer("v=0"),
    });
    h.signal(RelaySignal::Answer {
        from: stranger,
        description: SessionDescription::answer("v=0"),
    });
    h.signal(RelaySignal::IceCandidate {
        from: stranger,
        candidate: candidate("candidate:9"),
    });

    assert!(recv_within(&mut h.opened).await.is_none());
    assert!(drain(&mut h.sent).await.is_empty());

    let snapshot = h.snapshot().await;
    assert!(snapshot.links.is_empty());
    assert_eq!(snapshot.local_id, Some(h.local_id));
}
