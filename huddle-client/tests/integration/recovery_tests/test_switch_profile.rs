use huddle_client::transport::LinkEventKind;
use huddle_client::{ConnectivityStatus, Role};
use huddle_core::{PeerId, RelaySignal};

use crate::integration::init_tracing;
use crate::utils::{EngineHarness, Sent, drain, settle, test_config};

#[tokio::test(start_paused = true)]
async fn test_switch_rebuilds_links_on_selected_profile() {
    init_tracing();

    let mut h = EngineHarness::start(test_config()).await;
    let a = PeerId::new();
    let b = PeerId::new();
    h.join(&[a]);
    let to_a = h.next_opened().await;
    to_a.events
        .emit(LinkEventKind::Connectivity(ConnectivityStatus::Connected));
    settle().await;

    h.signal(RelaySignal::UserJoined(b));
    let to_b = h.next_opened().await;
    drain(&mut h.sent).await;
    assert_eq!(h.snapshot().await.last_good_profile.as_deref(), Some("p0"));

    h.handle.switch_profile("p2").await.unwrap();

    let mut rebuilt = vec![h.next_opened().await, h.next_opened().await];
    rebuilt.sort_by_key(|o| o.peer);
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(rebuilt.iter().map(|o| o.peer).collect::<Vec<_>>(), expected);
    assert!(rebuilt.iter().all(|o| o.profile == "p2"));
    assert!(to_a.connection.is_closed());
    assert!(to_b.connection.is_closed());

    // Both links now drive a fresh offer, including the former responder.
    let sent = drain(&mut h.sent).await;
    assert!(sent.contains(&Sent::Offer(a)));
    assert!(sent.contains(&Sent::Offer(b)));

    let snapshot = h.snapshot().await;
    assert_eq!(snapshot.selected_profile.as_deref(), Some("p2"));
    assert_eq!(snapshot.last_good_profile, None);
    assert!(snapshot.links.iter().all(|l| l.role == Role::Initiator && l.attempts == 0));
}

#[tokio::test(start_paused = true)]
async fn test_switch_to_unknown_profile_is_rejected() {
    init_tracing();

    let h = EngineHarness::start(test_config()).await;
    let err = h.handle.switch_profile("nope").await.unwrap_err();
    assert!(format!("{:#}", err).contains("nope"));
    assert_eq!(h.snapshot().await.selected_profile.as_deref(), Some("p0"));
}
