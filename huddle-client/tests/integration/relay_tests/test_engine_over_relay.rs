use huddle_client::diagnostics::MemorySink;
use huddle_client::media::{LocalMediaSession, MediaConstraints, MediaSource};
use huddle_client::{
    CallEngine, EngineHandle, EngineParts, ReconnectPolicy, RelayClient, RelayStatus,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::integration::init_tracing;
use crate::utils::{
    ConnCall, MockConnectionFactory, MockRenderSink, Opened, ScriptedMedia, eventually,
    spawn_relay, test_config, three_profiles, ws_url,
};

const LIMIT: Duration = Duration::from_secs(3);

struct Participant {
    handle: EngineHandle,
    opened: mpsc::UnboundedReceiver<Opened>,
}

async fn participant(addr: SocketAddr) -> Participant {
    let media = Arc::new(ScriptedMedia::granting(vec![MediaConstraints::BOTH]));
    let session = LocalMediaSession::acquire(media.as_ref()).await;
    let (factory, opened) = MockConnectionFactory::new();
    let (render, _rendered) = MockRenderSink::new();
    let (relay, relay_events, _relay_task) =
        RelayClient::spawn(ws_url(addr), ReconnectPolicy::default());

    let parts = EngineParts {
        catalog: three_profiles(),
        media: session,
        media_source: media as Arc<dyn MediaSource>,
        factory: Arc::new(factory),
        signaling: Arc::new(relay),
        render: Arc::new(render),
        diagnostics: Arc::new(MemorySink::default()),
    };
    let (handle, _task) = CallEngine::spawn(test_config(), parts, relay_events);

    Participant { handle, opened }
}

async fn first_opened(p: &mut Participant) -> Opened {
    tokio::time::timeout(LIMIT, p.opened.recv())
        .await
        .expect("no connection opened")
        .expect("engine stopped")
}

#[tokio::test]
async fn test_two_engines_negotiate_through_relay() {
    init_tracing();

    let (addr, room) = spawn_relay().await;
    let mut first = participant(addr).await;
    let first_id = loop {
        let snapshot = first.handle.snapshot().await.unwrap();
        if let Some(id) = snapshot.local_id {
            break id;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    };

    // The newcomer initiates toward everyone already present.
    let mut second = participant(addr).await;
    let offerer = first_opened(&mut second).await;
    assert_eq!(offerer.peer, first_id);
    let answerer = first_opened(&mut first).await;

    assert!(
        eventually(LIMIT, || answerer.connection.calls().contains(&ConnCall::AcceptOffer)).await,
        "offer never reached the existing participant"
    );
    assert!(
        eventually(LIMIT, || offerer.connection.calls().contains(&ConnCall::ApplyAnswer)).await,
        "answer never made it back"
    );

    let snapshot = second.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.relay, RelayStatus::Connected);
    assert_eq!(snapshot.participant_count(), 2);
    assert_eq!(room.members().await.unwrap().len(), 2);

    first.handle.shutdown().await.unwrap();
    second.handle.shutdown().await.unwrap();
}
