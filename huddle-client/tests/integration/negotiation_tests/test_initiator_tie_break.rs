use huddle_client::Role;
use huddle_core::{PeerId, RelaySignal, SessionDescription};

use crate::integration::init_tracing;
use crate::utils::{ConnCall, EngineHarness, Sent, drain, recv_within, test_config};

#[tokio::test(start_paused = true)]
async fn test_snapshot_members_are_initiated_joiners_are_awaited() {
    init_tracing();

    let mut h = EngineHarness::start(test_config()).await;
    let a = PeerId::new();
    let b = PeerId::new();
    h.join(&[a, b]);

    let first = h.next_opened().await;
    let second = h.next_opened().await;
    assert_eq!((first.peer, second.peer), (a, b));

    let sent = drain(&mut h.sent).await;
    assert_eq!(sent.iter().filter(|s| **s == Sent::Offer(a)).count(), 1);
    assert_eq!(sent.iter().filter(|s| **s == Sent::Offer(b)).count(), 1);

    // A participant announced by a join notification offers to us, not the other way round.
    let d = PeerId::new();
    h.signal(RelaySignal::UserJoined(d));
    let opened_d = h.next_opened().await;
    assert_eq!(opened_d.peer, d);

    let sent = drain(&mut h.sent).await;
    assert!(!sent.contains(&Sent::Offer(d)), "responder sent an offer: {:?}", sent);
    assert!(opened_d.connection.calls().is_empty());

    h.signal(RelaySignal::Offer {
        from: d,
        description: SessionDescription::offer("v=0"),
    });
    assert_eq!(h.next_sent().await, Sent::Answer(d));
    assert!(
        recv_within(&mut h.opened).await.is_none(),
        "first offer must reuse the waiting connection"
    );
    assert_eq!(opened_d.connection.calls(), vec![ConnCall::AcceptOffer]);

    let snapshot = h.snapshot().await;
    assert_eq!(snapshot.participant_count(), 4);
    assert_eq!(snapshot.link(&a).unwrap().role, Role::Initiator);
    assert_eq!(snapshot.link(&b).unwrap().role, Role::Initiator);
    assert_eq!(snapshot.link(&d).unwrap().role, Role::Responder);
}

#[tokio::test(start_paused = true)]
async fn test_exactly_one_side_initiates() {
    init_tracing();

    // Relay order: A joins an empty room, then B joins and sees A.
    let mut a = EngineHarness::start(test_config()).await;
    let mut b = EngineHarness::start(test_config()).await;
    a.join(&[]);
    b.join(&[a.local_id]);
    a.signal(RelaySignal::UserJoined(b.local_id));

    assert_eq!(a.next_opened().await.peer, b.local_id);
    assert_eq!(b.next_opened().await.peer, a.local_id);

    assert_eq!(b.next_sent().await, Sent::Offer(a.local_id));
    let from_a = drain(&mut a.sent).await;
    assert!(
        !from_a.iter().any(|s| matches!(s, Sent::Offer(_))),
        "both sides initiated: {:?}",
        from_a
    );

    let a_view = a.snapshot().await;
    let b_view = b.snapshot().await;
    assert_eq!(a_view.link(&b.local_id).unwrap().role, Role::Responder);
    assert_eq!(b_view.link(&a.local_id).unwrap().role, Role::Initiator);
}
