use crate::engine::{CallEngine, RelayStatus, close_quietly};
use crate::link::{ConnectivityStatus, Reaction, Role, TimerKind};
use crate::render::RemoteTrack;
use crate::rotator::{ProfileRotator, Rotation};
use crate::transport::{LinkEvent, LinkEventKind};
use huddle_core::{DiagnosticEvent, PeerId};
use std::sync::Arc;
use tracing::{debug, info, warn};

impl CallEngine {
    pub(super) async fn handle_link_event(&mut self, event: LinkEvent) {
        let LinkEvent {
            peer,
            generation,
            kind,
        } = event;

        let Some(link) = self.registry.get(&peer) else {
            debug!("Dropping {:?} for removed link {}", kind, peer);
            return;
        };
        if link.generation() != generation {
            debug!(
                "Dropping {:?} for {} from generation {} (current {})",
                kind,
                peer,
                generation,
                link.generation()
            );
            return;
        }

        match kind {
            LinkEventKind::Connectivity(status) => self.on_connectivity(peer, status).await,
            LinkEventKind::LocalCandidate(candidate) => {
                self.signaling.send_ice(peer, candidate).await
            }
            LinkEventKind::RemoteTrack(track) => self.on_remote_track(peer, track),
            LinkEventKind::LocalDescription(description) => {
                self.on_local_description(peer, description).await
            }
            LinkEventKind::AnswerApplied => self.flush_candidates(peer),
            LinkEventKind::NegotiationFailed(reason) => {
                warn!("Negotiation with {} failed: {}", peer, reason);
                self.fail_link(peer, reason).await;
            }
            LinkEventKind::Timer(kind) => self.on_timer(peer, kind).await,
        }
    }

    async fn on_connectivity(&mut self, peer: PeerId, status: ConnectivityStatus) {
        let Some(link) = self.registry.get_mut(&peer) else {
            return;
        };
        let generation = link.generation();
        let profile = link.profile().clone();

        match link.on_connectivity(status) {
            Reaction::None => {}
            Reaction::Connected { recovered } => {
                let kind = if recovered {
                    "link-recovered"
                } else {
                    "link-connected"
                };
                info!("Link to {} connected on {}", peer, profile.name);
                self.report(
                    DiagnosticEvent::new(kind, peer.to_string()).with_profile(profile.name.clone()),
                );
                self.last_good = Some(profile);
            }
            Reaction::StartGrace => {
                info!("Link to {} interrupted, waiting {:?}", peer, self.config.grace_period);
                let timer =
                    self.schedule(peer, generation, TimerKind::Grace, self.config.grace_period);
                if let Some(link) = self.registry.get_mut(&peer) {
                    link.set_grace_timer(timer);
                }
                self.report(
                    DiagnosticEvent::new("link-grace", peer.to_string()).with_profile(profile.name),
                );
            }
            Reaction::Fail => {
                self.fail_link(peer, format!("connectivity {:?}", status))
                    .await
            }
        }
    }

    async fn on_timer(&mut self, peer: PeerId, kind: TimerKind) {
        let Some(link) = self.registry.get(&peer) else {
            return;
        };
        if !link.timer_applies(kind) {
            debug!("{:?} timer for {} no longer applies", kind, peer);
            return;
        }

        match kind {
            TimerKind::Grace => self.fail_link(peer, "grace period expired").await,
            TimerKind::NegotiationTimeout => self.fail_link(peer, "negotiation timed out").await,
            TimerKind::Retry => {
                // The next snapshot from the relay rebuilds the link.
                if self.relay_status != RelayStatus::Connected {
                    info!("Relay offline, dropping link to {} instead of retrying", peer);
                    self.remove_link(&peer, "relay offline").await;
                    return;
                }
                self.open_attempt(peer, Role::Initiator).await;
            }
        }
    }

    /// Count a failure on `peer`'s link and either schedule the next profile
    /// or give the link up.
    pub(super) async fn fail_link(&mut self, peer: PeerId, reason: impl Into<String>) {
        let reason = reason.into();
        let catalog = &self.catalog;
        let last_good = self.last_good.as_ref();

        let Some(link) = self.registry.get_mut(&peer) else {
            return;
        };
        let failed_on = link.profile().name.clone();
        let (attempt, order) =
            link.record_failure(|| ProfileRotator::retry_order(catalog, last_good));
        let rotation = self.rotator.next(attempt, order);

        warn!(
            "Link to {} failed on {} (attempt {}): {}",
            peer, failed_on, attempt, reason
        );
        self.report(
            DiagnosticEvent::new("link-failed", format!("{} attempt {}", peer, attempt))
                .with_error(reason)
                .with_profile(failed_on),
        );

        match rotation {
            Rotation::Abandon => {
                warn!("Giving up on {} after {} attempt(s)", peer, attempt - 1);
                if let Some(link) = self.registry.get_mut(&peer) {
                    link.abandon();
                }
                self.report(DiagnosticEvent::new("link-abandoned", peer.to_string()));
                self.remove_link(&peer, "abandoned").await;
            }
            Rotation::Retry {
                profile,
                delay,
                attempt,
            } => {
                info!(
                    "Retrying {} on {} in {:?} (attempt {})",
                    peer, profile.name, delay, attempt
                );
                let generation = self.next_generation();
                let timer = self.schedule(peer, generation, TimerKind::Retry, delay);
                let Some(link) = self.registry.get_mut(&peer) else {
                    return;
                };
                let previous = link.schedule_retry(generation, profile.clone(), timer);
                self.report(
                    DiagnosticEvent::new("link-retry", format!("{} attempt {}", peer, attempt))
                        .with_profile(profile.name),
                );
                close_quietly(previous).await;
            }
        }
    }

    fn on_remote_track(&mut self, peer: PeerId, track: Arc<dyn RemoteTrack>) {
        let Some(link) = self.registry.get_mut(&peer) else {
            return;
        };
        let stream = link.remote_stream_mut();
        stream.upsert(track);
        let stream = stream.clone();
        self.render.on_stream(peer, stream);
    }
}
