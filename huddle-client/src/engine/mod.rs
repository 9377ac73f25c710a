use crate::diagnostics::DiagnosticsSink;
use crate::link::{LinkSnapshot, TimerHandle, TimerKind};
use crate::media::{LocalMediaSession, MediaSnapshot, MediaSource};
use crate::registry::PeerRegistry;
use crate::render::RenderSink;
use crate::rotator::ProfileRotator;
use crate::signaling::{RelayEvent, SignalingOutput};
use crate::transport::{ConnectionFactory, LinkEvent, LinkEventKind, LinkEvents, MediaConnection};
use huddle_core::{ConnectivityProfile, DiagnosticEvent, PeerId, ProfileCatalog};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

mod commands_impl;
mod engine_command;
mod engine_handle;
mod membership_impl;
mod negotiation_impl;
mod recovery_impl;

pub use engine_command::EngineCommand;
pub use engine_handle::EngineHandle;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Retry `n` of a failure episode waits `n` times this.
    pub retry_base_delay: Duration,
    /// How long a link may stay disconnected before it counts as failed.
    pub grace_period: Duration,
    /// How long a link may stay connecting before it counts as failed.
    pub negotiation_timeout: Duration,
    /// Catalog profile used for new links until one connects. First entry if unset.
    pub initial_profile: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retry_base_delay: Duration::from_secs(2),
            grace_period: Duration::from_secs(5),
            negotiation_timeout: Duration::from_secs(20),
            initial_profile: None,
        }
    }
}

/// Collaborators the engine drives.
pub struct EngineParts {
    pub catalog: ProfileCatalog,
    pub media: LocalMediaSession,
    pub media_source: Arc<dyn MediaSource>,
    pub factory: Arc<dyn ConnectionFactory>,
    pub signaling: Arc<dyn SignalingOutput>,
    pub render: Arc<dyn RenderSink>,
    pub diagnostics: Arc<dyn DiagnosticsSink>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelayStatus {
    Connecting,
    Connected,
    Reconnecting,
    Offline,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub local_id: Option<PeerId>,
    pub relay: RelayStatus,
    pub selected_profile: Option<String>,
    pub last_good_profile: Option<String>,
    pub media: MediaSnapshot,
    pub links: Vec<LinkSnapshot>,
}

impl EngineSnapshot {
    pub fn link(&self, peer: &PeerId) -> Option<&LinkSnapshot> {
        self.links.iter().find(|link| &link.peer == peer)
    }

    /// Remote participants plus ourselves.
    pub fn participant_count(&self) -> usize {
        self.links.len() + usize::from(self.local_id.is_some())
    }
}

/// Mesh call orchestrator.
///
/// Relay events, link events and operator commands are handled one at a
/// time on a single task. Negotiation steps run on spawned tasks and report
/// back as [`LinkEvent`]s, so a link may be gone or superseded by the time
/// its result arrives; such results are dropped by generation.
pub struct CallEngine {
    config: EngineConfig,
    rotator: ProfileRotator,
    catalog: ProfileCatalog,
    selected: Option<ConnectivityProfile>,
    last_good: Option<ConnectivityProfile>,
    registry: PeerRegistry,
    media: LocalMediaSession,
    media_source: Arc<dyn MediaSource>,
    factory: Arc<dyn ConnectionFactory>,
    signaling: Arc<dyn SignalingOutput>,
    render: Arc<dyn RenderSink>,
    diagnostics: Arc<dyn DiagnosticsSink>,
    local_id: Option<PeerId>,
    relay_status: RelayStatus,
    generation_counter: u64,
    relay_rx: mpsc::UnboundedReceiver<RelayEvent>,
    command_rx: mpsc::Receiver<EngineCommand>,
    link_tx: mpsc::UnboundedSender<LinkEvent>,
    link_rx: mpsc::UnboundedReceiver<LinkEvent>,
}

impl CallEngine {
    pub fn new(
        config: EngineConfig,
        parts: EngineParts,
        relay_rx: mpsc::UnboundedReceiver<RelayEvent>,
    ) -> (Self, EngineHandle) {
        let (command_tx, command_rx) = mpsc::channel(64);
        let (link_tx, link_rx) = mpsc::unbounded_channel();

        let selected = match config.initial_profile.as_deref() {
            Some(name) => parts.catalog.get(name).cloned().or_else(|| {
                warn!("Unknown profile '{}', using the first catalog entry", name);
                parts.catalog.first().cloned()
            }),
            None => parts.catalog.first().cloned(),
        };

        let engine = Self {
            rotator: ProfileRotator::new(config.retry_base_delay),
            config,
            catalog: parts.catalog,
            selected,
            last_good: None,
            registry: PeerRegistry::new(),
            media: parts.media,
            media_source: parts.media_source,
            factory: parts.factory,
            signaling: parts.signaling,
            render: parts.render,
            diagnostics: parts.diagnostics,
            local_id: None,
            relay_status: RelayStatus::Connecting,
            generation_counter: 0,
            relay_rx,
            command_rx,
            link_tx,
            link_rx,
        };

        (engine, EngineHandle::new(command_tx))
    }

    /// Build the engine and run it on its own task.
    pub fn spawn(
        config: EngineConfig,
        parts: EngineParts,
        relay_rx: mpsc::UnboundedReceiver<RelayEvent>,
    ) -> (EngineHandle, JoinHandle<()>) {
        let (engine, handle) = Self::new(config, parts, relay_rx);
        (handle, tokio::spawn(engine.run()))
    }

    pub async fn run(mut self) {
        info!(
            "Call engine started (viewer: {}, profiles: {:?})",
            self.media.is_viewer(),
            self.catalog.names()
        );
        if self.media.is_viewer() {
            self.report(DiagnosticEvent::new(
                "viewer-mode",
                "no local capture, receiving only",
            ));
        }

        let mut relay_open = true;
        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(EngineCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd).await,
                },

                Some(event) = self.link_rx.recv() => {
                    self.handle_link_event(event).await;
                }

                event = self.relay_rx.recv(), if relay_open => match event {
                    Some(event) => self.handle_relay_event(event).await,
                    None => {
                        relay_open = false;
                        self.handle_relay_event(RelayEvent::GaveUp).await;
                    }
                },
            }
        }

        let dropped = self.registry.clear().await;
        for peer in &dropped {
            self.render.on_removed(*peer);
        }
        info!("Call engine stopped, closed {} link(s)", dropped.len());
    }

    fn next_generation(&mut self) -> u64 {
        self.generation_counter += 1;
        self.generation_counter
    }

    fn events_for(&self, peer: PeerId, generation: u64) -> LinkEvents {
        LinkEvents::new(peer, generation, self.link_tx.clone())
    }

    fn schedule(
        &self,
        peer: PeerId,
        generation: u64,
        kind: TimerKind,
        delay: Duration,
    ) -> TimerHandle {
        let events = self.events_for(peer, generation);
        TimerHandle::new(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            events.emit(LinkEventKind::Timer(kind));
        }))
    }

    fn report(&self, event: DiagnosticEvent) {
        self.diagnostics.report(event);
    }
}

async fn close_quietly(connection: Option<Arc<dyn MediaConnection>>) {
    if let Some(connection) = connection
        && let Err(e) = connection.close().await
    {
        debug!("Closing superseded connection failed: {}", e);
    }
}
