use huddle_core::{PeerId, RelaySignal};

use crate::integration::init_tracing;
use crate::utils::{EngineHarness, Rendered, drain, test_config};

#[tokio::test(start_paused = true)]
async fn test_repeated_join_supersedes_link() {
    init_tracing();

    let mut h = EngineHarness::start(test_config()).await;
    let x = PeerId::new();
    h.join(&[]);

    h.signal(RelaySignal::UserJoined(x));
    let first = h.next_opened().await;
    h.signal(RelaySignal::UserJoined(x));
    let second = h.next_opened().await;

    assert!(first.connection.is_closed(), "old handle must be closed");
    assert!(!second.connection.is_closed());
    assert!(second.generation > first.generation);

    let snapshot = h.snapshot().await;
    assert_eq!(snapshot.links.len(), 1);
    assert_eq!(snapshot.link(&x).unwrap().generation, second.generation);

    let rendered = drain(&mut h.rendered).await;
    assert_eq!(rendered, vec![Rendered::Removed(x)]);
}
