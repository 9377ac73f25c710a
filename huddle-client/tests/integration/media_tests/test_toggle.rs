use huddle_client::media::MediaKind;
use huddle_core::PeerId;

use crate::integration::init_tracing;
use crate::utils::{ConnCall, EVENT_TIMEOUT, EngineHarness, test_config};

#[tokio::test(start_paused = true)]
async fn test_toggle_flips_tracks_without_renegotiating() {
    init_tracing();

    let mut h = EngineHarness::start(test_config()).await;
    h.join(&[PeerId::new()]);
    let opened = h.next_opened().await;
    assert_eq!(opened.tracks, vec![MediaKind::Audio, MediaKind::Video]);

    assert_eq!(h.handle.toggle_audio().await.unwrap(), Some(false));
    assert_eq!(h.handle.toggle_video().await.unwrap(), Some(false));
    assert_eq!(h.handle.toggle_audio().await.unwrap(), Some(true));

    let snapshot = h.snapshot().await;
    assert_eq!(snapshot.media.audio, Some(true));
    assert_eq!(snapshot.media.video, Some(false));

    assert!(h.opened_within(EVENT_TIMEOUT).await.is_none());
    assert_eq!(opened.connection.calls(), vec![ConnCall::CreateOffer]);
}
