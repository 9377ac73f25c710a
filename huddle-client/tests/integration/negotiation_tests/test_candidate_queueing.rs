use huddle_client::transport::LinkEventKind;
use huddle_core::{PeerId, RelaySignal, SessionDescription};

use crate::integration::init_tracing;
use crate::utils::{
    ConnCall, EngineHarness, Rendered, Sent, candidate, drain, recv_within, settle, test_config,
};

#[tokio::test(start_paused = true)]
async fn test_candidates_wait_for_remote_description() {
    init_tracing();

    let mut h = EngineHarness::start(test_config()).await;
    let b = PeerId::new();
    h.join(&[b]);
    let opened = h.next_opened().await;
    assert_eq!(h.next_sent().await, Sent::Offer(b));

    h.signal(RelaySignal::IceCandidate {
        from: b,
        candidate: candidate("candidate:early"),
    });
    settle().await;
    assert!(opened.connection.candidates().is_empty());

    h.signal(RelaySignal::Answer {
        from: b,
        description: SessionDescription::answer("v=0"),
    });
    settle().await;
    h.signal(RelaySignal::IceCandidate {
        from: b,
        candidate: candidate("candidate:late"),
    });
    settle().await;

    assert_eq!(
        opened.connection.calls(),
        vec![
            ConnCall::CreateOffer,
            ConnCall::ApplyAnswer,
            ConnCall::AddCandidate("candidate:early".into()),
            ConnCall::AddCandidate("candidate:late".into()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_local_candidates_are_forwarded() {
    init_tracing();

    let mut h = EngineHarness::start(test_config()).await;
    let b = PeerId::new();
    h.join(&[b]);
    let opened = h.next_opened().await;
    assert_eq!(h.next_sent().await, Sent::Offer(b));

    opened
        .events
        .emit(LinkEventKind::LocalCandidate(candidate("candidate:local")));
    assert_eq!(h.next_sent().await, Sent::Ice(b, "candidate:local".into()));
}

#[tokio::test(start_paused = true)]
async fn test_candidates_for_removed_link_are_discarded() {
    init_tracing();

    let mut h = EngineHarness::start(test_config()).await;
    let b = PeerId::new();
    h.join(&[b]);
    let opened = h.next_opened().await;
    drain(&mut h.sent).await;

    h.signal(RelaySignal::UserLeft(b));
    settle().await;
    assert!(opened.connection.is_closed());
    assert_eq!(drain(&mut h.rendered).await, vec![Rendered::Removed(b)]);

    h.signal(RelaySignal::IceCandidate {
        from: b,
        candidate: candidate("candidate:late"),
    });
    // Late output of the removed connection goes nowhere.
    opened
        .events
        .emit(LinkEventKind::LocalCandidate(candidate("candidate:stale")));
    settle().await;

    assert!(opened.connection.candidates().is_empty());
    assert!(drain(&mut h.sent).await.is_empty());
    assert!(recv_within(&mut h.opened).await.is_none());
    assert!(h.snapshot().await.links.is_empty());
}
