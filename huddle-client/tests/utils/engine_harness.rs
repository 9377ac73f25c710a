use crate::utils::{
    MockConnectionFactory, MockRenderSink, MockSignalingOutput, Opened, Rendered, ScriptedMedia,
    Sent, recv_within,
};
use huddle_client::diagnostics::MemorySink;
use huddle_client::media::{LocalMediaSession, MediaConstraints, MediaSource};
use huddle_client::{
    CallEngine, EngineConfig, EngineHandle, EngineParts, EngineSnapshot, RelayEvent,
};
use huddle_core::{ConnectivityProfile, IceCandidate, PeerId, ProfileCatalog, RelaySignal};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const BASE_DELAY: Duration = Duration::from_secs(2);
pub const GRACE: Duration = Duration::from_secs(5);

/// Config whose negotiation timeout never interferes unless a test wants it to.
pub fn test_config() -> EngineConfig {
    EngineConfig {
        retry_base_delay: BASE_DELAY,
        grace_period: GRACE,
        negotiation_timeout: Duration::from_secs(3600),
        initial_profile: None,
    }
}

/// Let the engine drain whatever was just emitted before the test looks at it.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

pub fn three_profiles() -> ProfileCatalog {
    ProfileCatalog::new(vec![
        ConnectivityProfile::new("p0", vec![]),
        ConnectivityProfile::new("p1", vec![]),
        ConnectivityProfile::new("p2", vec![]),
    ])
}

pub fn candidate(text: &str) -> IceCandidate {
    IceCandidate {
        candidate: text.to_owned(),
        sdp_mid: Some("0".into()),
        sdp_m_line_index: Some(0),
        username_fragment: None,
    }
}

/// A running engine wired to in-memory collaborators.
pub struct EngineHarness {
    pub local_id: PeerId,
    pub handle: EngineHandle,
    pub factory: MockConnectionFactory,
    pub media: Arc<ScriptedMedia>,
    pub diagnostics: MemorySink,
    pub relay_tx: mpsc::UnboundedSender<RelayEvent>,
    pub opened: mpsc::UnboundedReceiver<Opened>,
    pub sent: mpsc::UnboundedReceiver<Sent>,
    pub rendered: mpsc::UnboundedReceiver<Rendered>,
    pub task: JoinHandle<()>,
}

impl EngineHarness {
    /// Engine with audio and video capture and the three-profile catalog.
    pub async fn start(config: EngineConfig) -> Self {
        let media = ScriptedMedia::granting(vec![MediaConstraints::BOTH]);
        Self::start_with(config, three_profiles(), media).await
    }

    pub async fn start_with(
        config: EngineConfig,
        catalog: ProfileCatalog,
        media: ScriptedMedia,
    ) -> Self {
        let media = Arc::new(media);
        let session = LocalMediaSession::acquire(media.as_ref()).await;

        let (factory, opened) = MockConnectionFactory::new();
        let (signaling, sent) = MockSignalingOutput::new();
        let (render, rendered) = MockRenderSink::new();
        let diagnostics = MemorySink::default();
        let (relay_tx, relay_rx) = mpsc::unbounded_channel();

        let parts = EngineParts {
            catalog,
            media: session,
            media_source: Arc::clone(&media) as Arc<dyn MediaSource>,
            factory: Arc::new(factory.clone()),
            signaling: Arc::new(signaling),
            render: Arc::new(render),
            diagnostics: Arc::new(diagnostics.clone()),
        };
        let (handle, task) = CallEngine::spawn(config, parts, relay_rx);

        Self {
            local_id: PeerId::new(),
            handle,
            factory,
            media,
            diagnostics,
            relay_tx,
            opened,
            sent,
            rendered,
            task,
        }
    }

    /// Connect to the relay and receive the welcome and snapshot.
    pub fn join(&self, existing: &[PeerId]) {
        self.relay(RelayEvent::Connected);
        self.signal(RelaySignal::Welcome(self.local_id));
        self.signal(RelaySignal::ExistingUsers(existing.to_vec()));
    }

    pub fn relay(&self, event: RelayEvent) {
        self.relay_tx.send(event).expect("engine stopped");
    }

    pub fn signal(&self, signal: RelaySignal) {
        self.relay(RelayEvent::Signal(signal));
    }

    pub async fn next_opened(&mut self) -> Opened {
        recv_within(&mut self.opened)
            .await
            .expect("expected a connection to be opened")
    }

    /// Wait up to `limit` of (virtual) time for the next opened connection.
    pub async fn opened_within(&mut self, limit: Duration) -> Option<Opened> {
        tokio::time::timeout(limit, self.opened.recv())
            .await
            .ok()
            .flatten()
    }

    pub async fn next_sent(&mut self) -> Sent {
        recv_within(&mut self.sent)
            .await
            .expect("expected an outbound frame")
    }

    pub async fn snapshot(&self) -> EngineSnapshot {
        self.handle.snapshot().await.expect("engine stopped")
    }
}
