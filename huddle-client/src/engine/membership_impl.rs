use crate::engine::{CallEngine, RelayStatus};
use crate::link::{PeerLink, Role};
use crate::rotator::ProfileRotator;
use crate::signaling::RelayEvent;
use huddle_core::{DiagnosticEvent, PeerId, RelaySignal};
use tracing::{debug, error, info, warn};

impl CallEngine {
    pub(super) async fn handle_relay_event(&mut self, event: RelayEvent) {
        match event {
            RelayEvent::Connected => {
                info!("Relay connected");
                self.relay_status = RelayStatus::Connected;
                self.report(DiagnosticEvent::new("relay-connected", ""));
            }
            RelayEvent::Disconnected => {
                warn!("Relay disconnected, dropping {} link(s)", self.registry.len());
                self.relay_status = RelayStatus::Reconnecting;
                self.local_id = None;
                self.drop_all_links().await;
                self.report(DiagnosticEvent::new("relay-disconnected", "reconnecting"));
            }
            RelayEvent::GaveUp => {
                if self.relay_status == RelayStatus::Offline {
                    return;
                }
                error!("Relay unreachable, staying offline");
                self.relay_status = RelayStatus::Offline;
                self.local_id = None;
                self.drop_all_links().await;
                self.report(DiagnosticEvent::new("relay-gave-up", "reconnect attempts exhausted"));
            }
            RelayEvent::Signal(signal) => self.handle_signal(signal).await,
        }
    }

    async fn handle_signal(&mut self, signal: RelaySignal) {
        match signal {
            RelaySignal::Welcome(id) => {
                info!("Relay assigned identity {}", id);
                self.local_id = Some(id);
            }
            RelaySignal::ExistingUsers(ids) => {
                info!("{} participant(s) already present", ids.len());
                for id in ids {
                    if self.local_id != Some(id) {
                        self.create_link(id, Role::Initiator).await;
                    }
                }
            }
            RelaySignal::UserJoined(id) => {
                if self.local_id == Some(id) {
                    return;
                }
                info!("Participant {} joined", id);
                self.create_link(id, Role::Responder).await;
            }
            RelaySignal::UserLeft(id) => {
                info!("Participant {} left", id);
                self.remove_link(&id, "left").await;
            }
            RelaySignal::Offer { from, description } => {
                self.handle_remote_offer(from, description).await
            }
            RelaySignal::Answer { from, description } => {
                self.handle_remote_answer(from, description).await
            }
            RelaySignal::IceCandidate { from, candidate } => {
                self.handle_remote_candidate(from, candidate).await
            }
        }
    }

    /// Create the link to `peer`, replacing any existing one, and start its first attempt.
    pub(super) async fn create_link(&mut self, peer: PeerId, role: Role) {
        let Some(profile) = ProfileRotator::initial_profile(
            &self.catalog,
            self.last_good.as_ref(),
            self.selected.as_ref(),
        ) else {
            error!("No connectivity profile available for {}", peer);
            return;
        };

        let superseded = self.registry.contains(&peer);
        self.registry
            .insert(PeerLink::new(peer, role, profile.clone()))
            .await;
        if superseded {
            self.render.on_removed(peer);
        }

        info!("Link to {} created as {:?} on {}", peer, role, profile.name);
        self.report(
            DiagnosticEvent::new("link-created", format!("{} as {:?}", peer, role))
                .with_profile(profile.name),
        );

        self.open_attempt(peer, role).await;
    }

    /// Tear down the link to `peer`. Does nothing if it is already gone.
    pub(super) async fn remove_link(&mut self, peer: &PeerId, reason: &str) {
        if !self.registry.remove(peer).await {
            debug!("No link to {} to remove", peer);
            return;
        }
        self.render.on_removed(*peer);
        self.report(DiagnosticEvent::new(
            "link-removed",
            format!("{}: {}", peer, reason),
        ));
    }

    async fn drop_all_links(&mut self) {
        for peer in self.registry.clear().await {
            self.render.on_removed(peer);
        }
    }
}
